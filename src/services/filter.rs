// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Applies parsed query constraints to ranked results.

use crate::models::search::SearchFilter;

/// True when the item passes every constraint category. Within a
/// category the constraints are OR-ed; an empty category passes.
///
/// Pages with unknown size (0) are rejected outright when any size
/// constraint is present.
pub fn eval_filter(host: &str, content_type: &str, size: u64, filter: &SearchFilter) -> bool {
    if size == 0 && !filter.size.is_empty() {
        return false;
    }

    if !filter.size.is_empty()
        && !filter.size.iter().any(|constraint| {
            if constraint.greater {
                size > constraint.bytes
            } else {
                size < constraint.bytes
            }
        })
    {
        return false;
    }

    if !filter.domain.is_empty()
        && !filter
            .domain
            .iter()
            .any(|constraint| constraint.negate ^ (host == constraint.value))
    {
        return false;
    }

    if !filter.content_type.is_empty()
        && !filter.content_type.iter().any(|constraint| {
            constraint.negate
                ^ (!content_type.is_empty() && content_type.starts_with(&constraint.value))
        })
    {
        return false;
    }

    true
}
