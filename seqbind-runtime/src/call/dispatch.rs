//! Run-time overload resolution
//!
//! Same algorithm the generator emits for managed proxies: bucket the
//! variants by arity, then try each variant of the bucket in declaration
//! order and accept the first whose every parameter accepts its argument.

use crate::marshal::{Expect, Value};
use std::collections::BTreeMap;

/// Parameter expectations of one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Expect>,
}

impl Signature {
    pub fn new(params: Vec<Expect>) -> Self {
        Self { params }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn accepts(&self, args: &[Value]) -> bool {
        args.len() == self.params.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(expect, arg)| arg.satisfies(expect))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no overloaded method found for {class}.{method} that matched the arguments")]
pub struct OverloadError {
    pub class: String,
    pub method: String,
}

/// Variants of one overloaded method, bucketed by arity
#[derive(Debug, Clone)]
pub struct Overloads {
    class: String,
    method: String,
    variants: Vec<Signature>,
    buckets: BTreeMap<usize, Vec<usize>>,
}

impl Overloads {
    pub fn new(class: &str, method: &str) -> Self {
        Self {
            class: class.to_string(),
            method: method.to_string(),
            variants: Vec::new(),
            buckets: BTreeMap::new(),
        }
    }

    /// Add a variant; returns its index
    pub fn push(&mut self, signature: Signature) -> usize {
        let index = self.variants.len();
        self.buckets.entry(signature.arity()).or_default().push(index);
        self.variants.push(signature);
        index
    }

    pub fn with(mut self, signature: Signature) -> Self {
        self.push(signature);
        self
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn variant(&self, index: usize) -> Option<&Signature> {
        self.variants.get(index)
    }

    /// Index of the first variant, in declaration order, accepting `args`
    pub fn resolve(&self, args: &[Value]) -> Result<usize, OverloadError> {
        self.buckets
            .get(&args.len())
            .and_then(|bucket| {
                bucket
                    .iter()
                    .copied()
                    .find(|&index| self.variants[index].accepts(args))
            })
            .ok_or_else(|| OverloadError {
                class: self.class.clone(),
                method: self.method.clone(),
            })
    }
}
