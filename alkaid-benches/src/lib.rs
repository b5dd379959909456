//! Benchmark harness crate for Alkaid; see `benches/`.
