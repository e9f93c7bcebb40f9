//! Host page adapters. Implement the PageDriver port.
//!
//! WebDriver for a live tab; scripted mock for tests and demo runs.

pub mod mock_page;
pub mod webdriver;
