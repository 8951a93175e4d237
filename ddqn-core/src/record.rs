//! Types and traits for recording training metrics.
//!
//! # Core Components
//!
//! * [`Record`] - A container for storing named values
//! * [`RecordValue`] - An enum representing the values that can be stored
//! * [`AggregateRecorder`] - Stores records and writes them out on flush
//! * [`BufferedRecorder`] - A recorder that keeps records in memory
//! * [`NullRecorder`] - A recorder that discards all records
//!
//! # Basic Usage
//!
//! ```rust
//! use ddqn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(3.0));
//! record.insert("reward", RecordValue::Scalar(-1.0));
//!
//! assert_eq!(record.get_scalar("reward").unwrap(), -1.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::AggregateRecorder;
