use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pyo3::prelude::*;
use serde_json::{Map, Value};

use crate::config::EvalConfig;
use crate::error::EvalError;
use crate::metrics;
use crate::pipeline::Method;

fn to_py_err(err: EvalError) -> PyErr {
    match err {
        EvalError::Io { .. } | EvalError::Corpus(_) => {
            pyo3::exceptions::PyIOError::new_err(err.to_string())
        }
        _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
    }
}

fn value_to_py(py: Python<'_>, value: &Value) -> PyObject {
    match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.into_py(py),
        Value::Number(n) => match n.as_u64() {
            Some(u) => u.into_py(py),
            None => n.as_f64().unwrap_or(0.0).into_py(py),
        },
        Value::String(s) => s.into_py(py),
        Value::Array(items) => items
            .iter()
            .map(|item| value_to_py(py, item))
            .collect::<Vec<_>>()
            .into_py(py),
        Value::Object(map) => map_to_py(py, map).into_py(py),
    }
}

fn map_to_py(py: Python<'_>, map: &Map<String, Value>) -> HashMap<String, PyObject> {
    map.iter()
        .map(|(k, v)| (k.clone(), value_to_py(py, v)))
        .collect()
}

/// Evaluate a JSONL corpus. Returns one dict per method, in registry order.
#[pyfunction]
#[pyo3(signature = (
    path,
    methods=None,
    sample_size=10,
    test_ratio=0.2,
    morph_dictionary=None,
    lemma_lookup=None,
    word_vectors=None,
))]
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    py: Python<'_>,
    path: &str,
    methods: Option<Vec<String>>,
    sample_size: usize,
    test_ratio: f64,
    morph_dictionary: Option<String>,
    lemma_lookup: Option<String>,
    word_vectors: Option<String>,
) -> PyResult<Vec<HashMap<String, PyObject>>> {
    let mut config = EvalConfig {
        sample_size,
        test_ratio,
        ..Default::default()
    };
    config.resources.morph_dictionary = morph_dictionary.map(PathBuf::from);
    config.resources.lemma_lookup = lemma_lookup.map(PathBuf::from);
    config.resources.word_vectors = word_vectors.map(PathBuf::from);

    let methods = methods
        .map(|names| {
            names
                .iter()
                .map(|name| name.parse::<Method>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(to_py_err)?;

    let summary = py
        .allow_threads(|| crate::evaluate_corpus(Path::new(path), &config, methods.as_deref()))
        .map_err(to_py_err)?;

    Ok(summary
        .evaluation
        .results
        .iter()
        .map(|result| map_to_py(py, &result.to_map()))
        .collect())
}

/// Metrics bundle for per-record token lists.
#[pyfunction]
#[pyo3(signature = (tokens_list, test_ratio=0.2, top_n=10))]
pub fn compute_metrics(
    py: Python<'_>,
    tokens_list: Vec<Vec<String>>,
    test_ratio: f64,
    top_n: usize,
) -> HashMap<String, PyObject> {
    let metrics = metrics::compute_metrics(&tokens_list, test_ratio, top_n);
    map_to_py(py, &metrics.to_map())
}

/// Stable names of every method, in registry order.
#[pyfunction]
pub fn method_names() -> Vec<&'static str> {
    Method::ALL.iter().map(|m| m.name()).collect()
}
