use crate::ast::ValueType;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    If,
    For,
    Switch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub ty: ValueType,
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<ValueType>,
    pub returns: Vec<ValueType>,
}

/// Name tables visible at the current point of the parse.
///
/// Functions see a copy of the table taken on entry; every other block
/// writes straight into the enclosing table.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<ScopeKind>,
    variables: HashMap<String, Variable>,
    saved: Vec<HashMap<String, Variable>>,
    functions: HashMap<String, Signature>,
    returns: Option<Vec<ValueType>>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            scopes: vec![ScopeKind::Program],
            variables: HashMap::new(),
            saved: Vec::new(),
            functions: HashMap::new(),
            returns: None,
        }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current(&self) -> ScopeKind {
        self.scopes.last().copied().unwrap_or(ScopeKind::Program)
    }

    pub fn enter_function(&mut self, returns: Vec<ValueType>) {
        self.push(ScopeKind::Function);
        self.saved.push(self.variables.clone());
        self.returns = Some(returns);
    }

    pub fn exit_function(&mut self) {
        self.pop();
        if let Some(vars) = self.saved.pop() {
            self.variables = vars;
        }
        self.returns = None;
    }

    /// Declared return types of the enclosing function, if any.
    pub fn returns(&self) -> Option<&[ValueType]> {
        self.returns.as_deref()
    }

    /// `break` binds to the innermost loop or switch; only a loop accepts it.
    pub fn can_break(&self) -> bool {
        self.scopes
            .iter()
            .rev()
            .find(|s| matches!(s, ScopeKind::For | ScopeKind::Switch))
            == Some(&ScopeKind::For)
    }

    pub fn can_continue(&self) -> bool {
        self.scopes.contains(&ScopeKind::For)
    }

    pub fn declare_var(&mut self, name: &str, var: Variable) -> Result<(), String> {
        if self.variables.contains_key(name) {
            return Err(format!("variable '{}' is already declared", name));
        }
        self.variables.insert(name.to_string(), var);
        Ok(())
    }

    pub fn lookup_var(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn remove_var(&mut self, name: &str) {
        self.variables.remove(name);
    }

    pub fn declare_fn(&mut self, name: &str, sig: Signature) -> Result<(), String> {
        if self.functions.contains_key(name) {
            return Err(format!("function '{}' is already declared", name));
        }
        self.functions.insert(name.to_string(), sig);
        Ok(())
    }

    pub fn lookup_fn(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name)
    }

    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn fn_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_var() -> Variable {
        Variable {
            ty: ValueType::INT,
            constant: false,
        }
    }

    #[test]
    fn redeclaration_is_rejected() {
        let mut ctx = Context::new();
        ctx.declare_var("a", int_var()).unwrap();
        assert_eq!(
            ctx.declare_var("a", int_var()),
            Err("variable 'a' is already declared".to_string())
        );
    }

    #[test]
    fn function_tables_are_discarded_on_exit() {
        let mut ctx = Context::new();
        ctx.declare_var("global", int_var()).unwrap();
        ctx.enter_function(vec![]);
        assert!(ctx.lookup_var("global").is_some());
        ctx.declare_var("local", int_var()).unwrap();
        ctx.exit_function();
        assert!(ctx.lookup_var("local").is_none());
        assert!(ctx.lookup_var("global").is_some());
    }

    #[test]
    fn break_inside_switch_is_rejected_but_continue_is_not() {
        let mut ctx = Context::new();
        ctx.push(ScopeKind::For);
        ctx.push(ScopeKind::Switch);
        assert!(!ctx.can_break());
        assert!(ctx.can_continue());
        ctx.push(ScopeKind::If);
        assert!(!ctx.can_break());
        ctx.pop();
        ctx.pop();
        assert!(ctx.can_break());
    }
}
