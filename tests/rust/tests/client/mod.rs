//! Engine client tests

mod http;
