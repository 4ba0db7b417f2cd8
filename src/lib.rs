// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Ranked full-text search service for the Gemini protocol.
//!
//! The agent serves the `/search`, `/search_jump` and `/backlinks`
//! endpoints over the Gemini line protocol, ranking lexical matches from
//! the page store with a link-graph authority pass. It also exposes the
//! URL admission filter the crawler consults for every candidate link.

pub mod app;
pub mod error;
pub mod gemini;
pub mod models;
pub mod routes;
pub mod services;
