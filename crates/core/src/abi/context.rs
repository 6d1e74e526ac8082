use thiserror::Error;

use crate::db::{AbiEntry, AbiMap, Param, Selector};
use crate::expr::Expr;
use crate::render::{colorize, COLOR_GREEN};
use crate::resolver::{resolve_param, ParamRef};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Selector {0} is not part of the active ABI")]
    UnknownSelector(Selector),
}

/// The ABI of one analysis run plus the function currently being rendered.
///
/// Each run owns its own value, so concurrent runs can never observe each
/// other's bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbiContext {
    abi: AbiMap,
    current: Option<Selector>,
}

impl AbiContext {
    pub fn new(abi: AbiMap) -> Self {
        Self { abi, current: None }
    }

    pub fn current_abi(&self) -> &AbiMap {
        &self.abi
    }

    /// Bind `selector` as the function subsequent resolver calls refer to.
    pub fn enter_function(&mut self, selector: &Selector) -> Result<(), ContextError> {
        if !self.abi.contains_key(selector) {
            return Err(ContextError::UnknownSelector(selector.clone()));
        }
        self.current = Some(selector.clone());
        Ok(())
    }

    pub fn leave_function(&mut self) {
        self.current = None;
    }

    pub fn current_selector(&self) -> Option<&Selector> {
        self.current.as_ref()
    }

    pub fn current_entry(&self) -> Option<&AbiEntry> {
        self.current.as_ref().and_then(|s| self.abi.get(s))
    }

    pub fn abi_entry_for(&self, selector: &Selector) -> Option<&AbiEntry> {
        self.abi.get(selector)
    }

    /// Give the current function the parameters the decompiler inferred, unless
    /// the ABI already knows them. Returns whether anything was set.
    pub fn set_func_params_if_none<I, T, N>(&mut self, params: I) -> bool
    where
        I: IntoIterator<Item = (T, N)>,
        T: Into<String>,
        N: Into<String>,
    {
        let Some(selector) = self.current.as_ref() else {
            return false;
        };
        let Some(entry) = self.abi.get_mut(selector) else {
            return false;
        };
        if entry.params.is_some() {
            return false;
        }
        entry.params = Some(params.into_iter().map(|(ty, name)| Param::new(ty, name)).collect());
        true
    }

    /// Folded `name(type,type)` form, available only when parameters are known.
    pub fn abi_name(&self, selector: &Selector) -> Option<String> {
        let entry = self.abi.get(selector)?;
        let params = entry.params.as_ref()?;
        let types: Vec<&str> = params.iter().map(|p| p.ty.as_str()).collect();
        Some(format!("{}({})", entry.name, types.join(",")))
    }

    /// Display form `name(type paramName, ...)`; falls back to the folded name
    /// when parameters are unknown.
    pub fn func_name(&self, selector: &Selector, add_color: bool) -> Option<String> {
        let entry = self.abi.get(selector)?;
        let Some(params) = entry.params.as_ref() else {
            return Some(entry.folded_name.clone());
        };
        let rendered: Vec<String> = params
            .iter()
            .map(|p| {
                let name = p.name.strip_suffix('_').unwrap_or(&p.name);
                format!("{} {}", p.ty, colorize(name, COLOR_GREEN, add_color))
            })
            .collect();
        Some(format!("{}({})", entry.name, rendered.join(", ")))
    }

    pub fn func_params(&self, selector: &Selector) -> &[Param] {
        self.abi.get(selector).and_then(|e| e.params.as_deref()).unwrap_or(&[])
    }

    /// Name the calldata read `expr` in terms of the current function's parameters.
    pub fn param_name(&self, expr: &Expr, add_color: bool) -> ParamRef {
        resolve_param(self, expr, add_color)
    }
}
