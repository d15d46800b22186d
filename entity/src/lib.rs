//! sea-orm entities backing the durable store.

pub mod kv_entries;
