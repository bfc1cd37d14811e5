//! Broker integration tests
//!
//! End-to-end invoke flows over in-memory mocks: pool reuse, decryption
//! counting, and the full error taxonomy.
