//! Multimodal journey planner server.
//!
//! Builds a combined street and transit graph from a street network and
//! timetable feeds, then answers journey queries with a multi-criteria
//! label-setting router that trades arrival time against transfers.

pub mod builder;
pub mod domain;
pub mod feed;
pub mod graph;
pub mod index;
pub mod network;
pub mod router;
pub mod web;
