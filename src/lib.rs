//! folio-server - portfolio site backend
//!
//! Serves three surfaces from one binary: the public marketing-site API
//! (contact form, published projects, profile, tracking beacons), the
//! authenticated admin API under `/admin/v1`, and a self-hosted
//! analytics pipeline (ingestion, aggregation, CSV/JSON export,
//! retention cleanup, live SSE stream).
//!
//! # Architecture
//! - `analytics`: tracking ingestion, aggregation, reporting, retention
//! - `api`: HTTP services, auth and rate-limit middleware, JWT
//! - `client`: blocking consumer for the live analytics endpoints
//! - `services`: domain services (contacts, projects, profile, mail,
//!   uploads, GeoIP)
//! - `storage`: SeaORM connection and migrations
//! - `config`: layered configuration

pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod utils;
