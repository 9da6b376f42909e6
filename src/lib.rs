//! Eggtimer - time the phases a program reports in its own output
//!
//! This library runs a child process, stamps every line it writes to stdout
//! or stderr with the time elapsed since start, and folds those lines into
//! named segments using pluggable start/finish recognizers.
//!
//! ```no_run
//! use eggtimer::definition::RegexDefinition;
//! use eggtimer::runner::Runner;
//! use eggtimer::segmenter::Segmenter;
//! use eggtimer::session::measure;
//! use std::process::Command;
//!
//! let mut segmenter = Segmenter::new();
//! segmenter.add_definition(RegexDefinition::new("Phase", r"^BEGIN (\w+)", r"^END (\w+)")?);
//!
//! let mut command = Command::new("./build.sh");
//! command.arg("--all");
//!
//! let measurement = measure(&Runner::default(), &segmenter, command, |_| {});
//! for segment in measurement.segments.sorted() {
//!     println!("{}: {:?}", segment.name, segment.elapsed());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod definition;
pub mod error;
pub mod event;
pub mod process;
pub mod report;
pub mod runner;
pub mod segment;
pub mod segmenter;
pub mod session;
