//! Integration tests for folio-app.
//!
//! These tests run the dashboard against a mock upstream that serves the
//! NGX status and chart endpoints and the spreadsheet values API.

pub mod common;
