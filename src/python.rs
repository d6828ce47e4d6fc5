//! Python bindings via PyO3
//!
//! Trees cross the boundary as JSON strings in the stored shape, records as
//! dicts of numbers and strings.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict};

use crate::condition::{cache, AstNode, Connective};
use crate::config::{deserialize_engine_config, EngineConfig};
use crate::engine::RuleEngine;
use crate::record::{Record, Value};

/// Process-wide engine holding named rules
static ENGINE: OnceCell<RwLock<RuleEngine>> = OnceCell::new();

fn engine() -> PyResult<&'static RwLock<RuleEngine>> {
    ENGINE
        .get()
        .ok_or_else(|| PyRuntimeError::new_err("Engine not initialized. Call init_engine() first."))
}

/// Convert a Python dict into a Record
///
/// Values must be `str`, `int` or `float`. `bool` is refused even though
/// Python treats it as an `int`, so `True` never silently compares as `1`.
fn extract_record(data: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::new();
    for (key, value) in data.iter() {
        let field: String = key.extract()?;
        let value = if value.is_instance_of::<PyBool>() {
            return Err(PyTypeError::new_err(format!(
                "Field {} is a bool; use a number or a string",
                field
            )));
        } else if let Ok(text) = value.extract::<String>() {
            Value::Text(text)
        } else if let Ok(number) = value.extract::<f64>() {
            Value::Number(number)
        } else {
            return Err(PyTypeError::new_err(format!(
                "Field {} must be a number or a string",
                field
            )));
        };
        record.insert(field, value);
    }
    Ok(record)
}

/// Parse a rule string and return its AST as JSON
#[pyfunction]
fn build_rule(rule: &str) -> PyResult<String> {
    Ok(crate::build_rule(rule)?.to_json())
}

/// Combine JSON ASTs into one, joined by `connective` ("AND" or "OR")
#[pyfunction]
#[pyo3(signature = (asts, connective="AND"))]
fn combine_rules(asts: Vec<String>, connective: &str) -> PyResult<String> {
    let connective: Connective = connective.parse()?;
    let trees = asts
        .iter()
        .map(|json| AstNode::from_json(json))
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(crate::combine_rules(trees, connective)?.to_json())
}

/// Evaluate a JSON AST against a dict
#[pyfunction]
fn evaluate_rule(ast: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let ast = AstNode::from_json(ast)?;
    let record = extract_record(data)?;
    Ok(crate::evaluate_rule(&ast, &record)?)
}

/// Initialize (or reset) the process-wide engine
///
/// # Arguments
/// * `config` - Optional dict with `max_rule_length`, `max_depth`,
///   `default_connective`, `cache_rules` and `cache_capacity`
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_engine(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let config = match config {
        Some(dict) => deserialize_engine_config(dict)?,
        None => EngineConfig::default(),
    };

    // If already initialized, replace the engine and its rules
    if let Some(existing) = ENGINE.get() {
        *existing.write() = RuleEngine::new(config);
    } else {
        let _ = ENGINE.set(RwLock::new(RuleEngine::new(config)));
    }
    Ok(())
}

/// Build and store a named rule; returns its AST as JSON
#[pyfunction]
fn register_rule(rule_id: String, rule: &str) -> PyResult<String> {
    let ast = engine()?.write().register_rule(rule_id, rule)?;
    Ok(ast.to_json())
}

/// Fetch a named rule's AST as JSON
#[pyfunction]
fn get_rule(rule_id: &str) -> PyResult<Option<String>> {
    Ok(engine()?.read().rule(rule_id).map(AstNode::to_json))
}

/// Sorted ids of all registered rules
#[pyfunction]
fn list_rules() -> PyResult<Vec<String>> {
    Ok(engine()?
        .read()
        .rule_ids()
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Combine named rules in the given order; returns the AST as JSON
#[pyfunction]
#[pyo3(signature = (rule_ids, connective=None))]
fn combine_registered(rule_ids: Vec<String>, connective: Option<&str>) -> PyResult<String> {
    let connective = connective.map(str::parse::<Connective>).transpose()?;
    let ast = engine()?.read().combine_rules(rule_ids.as_slice(), connective)?;
    Ok(ast.to_json())
}

/// Evaluate a named rule against a dict
#[pyfunction]
fn evaluate_registered(rule_id: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = extract_record(data)?;
    Ok(engine()?.read().evaluate_rule(rule_id, &record)?)
}

/// Drop every cached parse, in the shared cache and the engine's own
#[pyfunction]
fn clear_rule_cache() {
    cache::clear_cache();
    if let Some(engine) = ENGINE.get() {
        engine.read().clear_cache();
    }
}

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(build_rule, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(register_rule, m)?)?;
    m.add_function(wrap_pyfunction!(get_rule, m)?)?;
    m.add_function(wrap_pyfunction!(list_rules, m)?)?;
    m.add_function(wrap_pyfunction!(combine_registered, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_registered, m)?)?;
    m.add_function(wrap_pyfunction!(clear_rule_cache, m)?)?;
    Ok(())
}
