//! Core data types shared between the agent and collector-side tooling

pub mod event;
