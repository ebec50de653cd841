//! Client for the Microsoft Dataverse (Dynamics 365) Web API

pub mod api;
pub mod config;
