use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Error deserializing parameters")]
    Deserialize(#[from] toml::de::Error),

    #[error("Parameter toml does not have the right structure (error in '{0}')")]
    BadToml(String),

    #[error("Element '{path}' not found")]
    NotFound { path: String },

    #[error("Cannot cast parameter '{path}' to {dtype}")]
    BadCast { path: String, dtype: String },

    #[error("Element '{path}' is not a parameter")]
    NotAParameter { path: String },

    #[error("Element '{path}' is not a map")]
    NotAMap { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ParameterValue {
    #[serde(rename = "bool")]
    Bool { val: bool },
    #[serde(rename = "int")]
    Int { val: i64 },
    #[serde(rename = "float")]
    Float { val: f64 },
    #[serde(rename = "str")]
    String { val: String },
    #[serde(rename = "float[]")]
    FloatArray { val: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    path: String,
    value: ParameterValue,
}

impl Parameter {
    pub fn path(&self) -> &str {
        &self.path
    }

    fn bad_cast(&self, dtype: &str) -> Error {
        Error::BadCast {
            path: self.path.clone(),
            dtype: dtype.to_string(),
        }
    }

    pub fn value_bool(&self) -> Result<bool, Error> {
        match self.value {
            ParameterValue::Bool { val } => Ok(val),
            _ => Err(self.bad_cast("bool")),
        }
    }

    pub fn value_int(&self) -> Result<i64, Error> {
        match self.value {
            ParameterValue::Int { val } => Ok(val),
            _ => Err(self.bad_cast("int")),
        }
    }

    pub fn value_float(&self) -> Result<f64, Error> {
        match self.value {
            ParameterValue::Float { val } => Ok(val),
            _ => Err(self.bad_cast("float")),
        }
    }

    pub fn value_string(&self) -> Result<&str, Error> {
        match &self.value {
            ParameterValue::String { val } => Ok(val),
            _ => Err(self.bad_cast("str")),
        }
    }

    pub fn value_float_arr(&self) -> Result<&[f64], Error> {
        match &self.value {
            ParameterValue::FloatArray { val } => Ok(val),
            _ => Err(self.bad_cast("float[]")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterMap {
    path: String,
    map: BTreeMap<String, ParameterTree>,
}

impl ParameterMap {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up a dotted path relative to this map, e.g. `sim.period_ms`
    pub fn get(&self, rel_path: &str) -> Result<&ParameterTree, Error> {
        let not_found = || Error::NotFound {
            path: append_path(&self.path, rel_path),
        };

        let mut parts = rel_path.split('.');
        let mut elem = parts
            .next()
            .and_then(|key| self.map.get(key))
            .ok_or_else(not_found)?;

        for part in parts {
            elem = match elem {
                ParameterTree::Node(n) => n.map.get(part).ok_or_else(not_found)?,
                ParameterTree::Leaf(_) => return Err(not_found()),
            };
        }

        Ok(elem)
    }

    pub fn get_param(&self, rel_path: &str) -> Result<&Parameter, Error> {
        self.get(rel_path)?.as_param()
    }

    pub fn get_map(&self, rel_path: &str) -> Result<&ParameterMap, Error> {
        self.get(rel_path)?.as_map()
    }

    pub fn iter(&self) -> ParameterMapIter<'_> {
        ParameterMapIter {
            iter: self.map.iter(),
        }
    }
}

pub struct ParameterMapIter<'a> {
    iter: btree_map::Iter<'a, String, ParameterTree>,
}

impl<'a> Iterator for ParameterMapIter<'a> {
    type Item = (&'a String, &'a ParameterTree);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterTree {
    Node(ParameterMap),
    Leaf(Parameter),
}

impl ParameterTree {
    fn as_param(&self) -> Result<&Parameter, Error> {
        match self {
            Self::Leaf(p) => Ok(p),
            Self::Node(m) => Err(Error::NotAParameter {
                path: m.path.clone(),
            }),
        }
    }

    fn as_map(&self) -> Result<&ParameterMap, Error> {
        match self {
            Self::Node(m) => Ok(m),
            Self::Leaf(p) => Err(Error::NotAMap {
                path: p.path.clone(),
            }),
        }
    }
}

/// Turns a missing element into `None`, keeping every other error
pub fn optional<T>(res: Result<T, Error>) -> Result<Option<T>, Error> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn parse_string(toml_str: &str) -> Result<ParameterMap, Error> {
    let table = toml::from_str::<Table>(toml_str)?;

    parse_table(table)
}

pub fn parse_table(table: Table) -> Result<ParameterMap, Error> {
    parse_table_recursive(table, String::new())
}

fn parse_table_recursive(table: Table, root: String) -> Result<ParameterMap, Error> {
    let mut nodes = BTreeMap::new();

    for (key, val) in table.into_iter() {
        let path = append_path(&root, &key);
        match val {
            Value::Table(val) => {
                // A table is a leaf when it has the `{ val, type }` shape
                if let Ok(value) = val.clone().try_into::<ParameterValue>() {
                    nodes.insert(key, ParameterTree::Leaf(Parameter { path, value }));
                } else if val.contains_key("type") {
                    return Err(Error::BadToml(path));
                } else {
                    nodes.insert(key, ParameterTree::Node(parse_table_recursive(val, path)?));
                }
            }
            _ => {
                return Err(Error::BadToml(path));
            }
        }
    }

    Ok(ParameterMap {
        path: root,
        map: nodes,
    })
}

fn append_path(root: &str, key: &str) -> String {
    format!("{root}.{key}")
}
