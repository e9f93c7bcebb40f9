//! vpass-tally: card-usage notification aggregation over a live webmail tab,
//! with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
