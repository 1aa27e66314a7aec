// Copyright 2025 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
#![cfg(feature = "python_bindings")]
use once_cell::sync::Lazy;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::wrap_pyfunction;

use crate::error::Error;
use crate::function::RegexReplace as Registration;

fn to_py_err(err: Error) -> PyErr {
    anyhow::Error::from(err).into()
}

/// One shared registration backing the module-level convenience function.
static MODULE_STATE: Lazy<Registration> = Lazy::new(Registration::new);

#[pyfunction]
#[pyo3(signature = (pattern, subject, replacement))]
fn regex_replace(
    pattern: Option<&str>,
    subject: Option<&str>,
    replacement: Option<&str>,
) -> PyResult<Option<String>> {
    MODULE_STATE
        .invoke(pattern, subject, replacement)
        .map_err(to_py_err)
}

/// A standalone registration with its own pattern cache, for hosts that
/// want per-connection or per-session cache lifetimes instead of the
/// module-wide one.
#[pyclass]
pub struct RegexReplace {
    inner: Registration,
}

#[pymethods]
impl RegexReplace {
    #[new]
    #[pyo3(signature = (capacity=None))]
    fn new(capacity: Option<usize>) -> Self {
        let inner = match capacity {
            Some(n) => Registration::with_capacity(n),
            None => Registration::new(),
        };
        Self { inner }
    }

    #[pyo3(signature = (pattern, subject, replacement))]
    fn invoke(
        &self,
        pattern: Option<&str>,
        subject: Option<&str>,
        replacement: Option<&str>,
    ) -> PyResult<Option<String>> {
        self.inner
            .invoke(pattern, subject, replacement)
            .map_err(to_py_err)
    }

    fn cache_len(&self) -> usize {
        self.inner.cache().len()
    }

    fn stats<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let stats = self.inner.cache().stats();
        let dict = PyDict::new_bound(py);
        dict.set_item("hits", stats.hits)?;
        dict.set_item("misses", stats.misses)?;
        dict.set_item("compiled", stats.compiled)?;
        dict.set_item("evicted", stats.evicted)?;
        Ok(dict)
    }

    fn reset_stats(&self) {
        self.inner.cache().reset_stats();
    }
}

#[pymodule]
pub fn faster_replace(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<RegexReplace>()?;
    m.add_function(wrap_pyfunction!(regex_replace, m)?)?;
    Ok(())
}
