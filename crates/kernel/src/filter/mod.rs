//! Filter engine module.
//!
//! This module provides:
//! - Operator / FilterOp: named comparison operators and custom predicates
//! - coerce: conversion of loosely-typed values into column types
//! - Criterion: one compiled, pre-coerced filter condition
//! - FilterEngine: compiles inputs into criteria and applies them

mod coerce;
mod criterion;
mod engine;
mod types;

pub use coerce::{Coerced, coerce_filter_value, coerce_scalar, parse_date, parse_instant, parse_number};
pub use criterion::{Criterion, DateCriterion, FunctionCriterion, ValueCriterion};
pub use engine::FilterEngine;
pub use types::{FilterDescriptor, FilterFn, FilterOp, Operator, filter_fn};
