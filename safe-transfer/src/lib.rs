//! Safe transfer: public transit routes ranked by predicted crowding.
//!
//! Answers "which way across the city keeps me out of crowded buses and
//! trains?" by scoring every concrete route a directions provider offers
//! against historical ridership and occupancy data.

pub mod cache;
pub mod domain;
pub mod history;
pub mod odsay;
pub mod planner;
