//! Per-format handlers and the transient storage they read from.
//!
//! ```text
//! storage ──▶ pdf   (lopdf load + save)      ──▶ BinaryPayload
//!         ├─▶ docx  (zip + quick-xml)        ──▶ { "text": … }
//!         └─▶ xlsx  (calamine, first sheet)  ──▶ [ {header: value}, … ]
//! ```
//!
//! Every handler is synchronous and CPU/IO-bound; [`crate::convert`] runs
//! them on the blocking pool.

pub mod docx;
pub mod pdf;
pub mod storage;
pub mod xlsx;
