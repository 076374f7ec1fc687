use crate::object::BUILTINS;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SymbolScope {
    GlobalScope,
    LocalScope,
    BuiltinScope,
    FreeScope,
    FunctionScope,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Symbol {
    name: String,
    scope: SymbolScope,
    index: usize,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn scope(&self) -> SymbolScope {
        self.scope
    }
}

#[derive(Clone, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,

    store: HashMap<String, Rc<Symbol>>,
    num_definitions: usize,

    free_symbols: Vec<Rc<Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            outer: None,
            store: HashMap::new(),
            num_definitions: 0,
            free_symbols: Vec::new(),
        }
    }
    pub fn new_enclosed_symbol_table(outer: Box<SymbolTable>) -> Self {
        Self {
            outer: Some(outer),
            store: HashMap::new(),
            num_definitions: 0,
            free_symbols: Vec::new(),
        }
    }
    pub fn define(&mut self, name: &str) -> Rc<Symbol> {
        let scope = match self.outer {
            Some(_) => SymbolScope::LocalScope,
            None => SymbolScope::GlobalScope,
        };
        let symbol = Rc::new(Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        });
        self.store.insert(name.to_string(), Rc::clone(&symbol));
        self.num_definitions += 1;
        symbol
    }
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Rc<Symbol> {
        let symbol = Rc::new(Symbol {
            name: name.to_string(),
            scope: SymbolScope::BuiltinScope,
            index,
        });
        self.store.insert(name.to_string(), Rc::clone(&symbol));
        symbol
    }
    pub fn define_builtins(&mut self) {
        for (i, builtin) in BUILTINS.iter().enumerate() {
            self.define_builtin(i, builtin.name());
        }
    }
    // Lets a function body refer to the function's own name before the
    // enclosing `let` binding exists; compiled as OpCurrentClosure.
    pub fn define_function_name(&mut self, name: &str) -> Rc<Symbol> {
        let symbol = Rc::new(Symbol {
            name: name.to_string(),
            scope: SymbolScope::FunctionScope,
            index: 0,
        });
        self.store.insert(name.to_string(), Rc::clone(&symbol));
        symbol
    }
    fn define_free(&mut self, original: Rc<Symbol>) -> Rc<Symbol> {
        let symbol = Rc::new(Symbol {
            name: original.name.clone(),
            scope: SymbolScope::FreeScope,
            index: self.free_symbols.len(),
        });
        self.free_symbols.push(original);
        self.store
            .insert(symbol.name.clone(), Rc::clone(&symbol));
        symbol
    }
    // A hit in an outer frame with Local or Free scope is promoted: the
    // original is recorded in free_symbols and this frame resolves the name
    // as Free from now on. Globals and builtins are reachable directly.
    pub fn resolve(&mut self, name: &str) -> Option<Rc<Symbol>> {
        if let Some(symbol) = self.store.get(name) {
            return Some(Rc::clone(symbol));
        }
        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        match symbol.scope() {
            SymbolScope::GlobalScope | SymbolScope::BuiltinScope => Some(symbol),
            _ => Some(self.define_free(symbol)),
        }
    }
    pub fn outer(&self) -> Option<&SymbolTable> {
        self.outer.as_deref()
    }
    pub fn take_outer(&mut self) -> Option<Box<SymbolTable>> {
        self.outer.take()
    }
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }
    pub fn free_symbols(&self) -> &[Rc<Symbol>] {
        &self.free_symbols
    }
}

#[cfg(test)]
mod tests {
    use crate::symbol_table::SymbolScope::*;
    use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};
    use std::rc::Rc;

    fn symbol(name: &str, scope: SymbolScope, index: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope,
            index,
        }
    }

    #[test]
    fn test_define() {
        let mut global = SymbolTable::new();

        let a = global.define("a");
        assert_eq!(a, Rc::new(symbol("a", GlobalScope, 0)));

        let b = global.define("b");
        assert_eq!(b, Rc::new(symbol("b", GlobalScope, 1)));

        let mut local = SymbolTable::new_enclosed_symbol_table(Box::new(global));
        let c = local.define("c");
        assert_eq!(c, Rc::new(symbol("c", LocalScope, 0)));
    }

    #[test]
    fn test_resolve_global() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");
        let tests = vec![
            ("a", symbol("a", GlobalScope, 0)),
            ("b", symbol("b", GlobalScope, 1)),
        ];
        for (name, expected) in tests {
            let res = global.resolve(name).unwrap();
            assert_eq!(&*res, &expected);
        }
    }

    #[test]
    fn test_resolve_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");

        let mut local = SymbolTable::new_enclosed_symbol_table(Box::new(global));
        local.define("c");
        local.define("d");

        let tests = vec![
            ("a", symbol("a", GlobalScope, 0)),
            ("b", symbol("b", GlobalScope, 1)),
            ("c", symbol("c", LocalScope, 0)),
            ("d", symbol("d", LocalScope, 1)),
        ];
        for (name, expected) in tests {
            let res = local.resolve(name).unwrap();
            assert_eq!(&*res, &expected);
        }
    }

    #[test]
    fn test_resolve_free() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");

        let mut first_local = SymbolTable::new_enclosed_symbol_table(Box::new(global));
        first_local.define("c");
        first_local.define("d");

        let mut second_local = SymbolTable::new_enclosed_symbol_table(Box::new(first_local));
        second_local.define("e");
        second_local.define("f");

        let tests = vec![
            ("a", symbol("a", GlobalScope, 0)),
            ("b", symbol("b", GlobalScope, 1)),
            ("c", symbol("c", FreeScope, 0)),
            ("d", symbol("d", FreeScope, 1)),
            ("e", symbol("e", LocalScope, 0)),
            ("f", symbol("f", LocalScope, 1)),
        ];
        for (name, expected) in tests {
            let res = second_local.resolve(name).unwrap();
            assert_eq!(&*res, &expected);
        }

        let expected_free = vec![symbol("c", LocalScope, 0), symbol("d", LocalScope, 1)];
        assert_eq!(second_local.free_symbols().len(), expected_free.len());
        for (actual, expected) in second_local.free_symbols().iter().zip(expected_free.iter()) {
            assert_eq!(&**actual, expected);
        }
    }

    #[test]
    fn test_resolve_unresolvable_free() {
        let mut global = SymbolTable::new();
        global.define("a");

        let mut first_local = SymbolTable::new_enclosed_symbol_table(Box::new(global));
        first_local.define("c");

        let mut second_local = SymbolTable::new_enclosed_symbol_table(Box::new(first_local));
        second_local.define("e");
        second_local.define("f");

        let tests = vec![
            ("a", symbol("a", GlobalScope, 0)),
            ("c", symbol("c", FreeScope, 0)),
            ("e", symbol("e", LocalScope, 0)),
            ("f", symbol("f", LocalScope, 1)),
        ];
        for (name, expected) in tests {
            let res = second_local.resolve(name).unwrap();
            assert_eq!(&*res, &expected);
        }

        for name in &["b", "d"] {
            assert!(second_local.resolve(name).is_none());
        }
    }

    #[test]
    fn test_define_resolve_builtins() {
        let mut global = SymbolTable::new();

        let expected_symbols = vec![
            symbol("a", BuiltinScope, 0),
            symbol("b", BuiltinScope, 1),
            symbol("c", BuiltinScope, 2),
            symbol("d", BuiltinScope, 3),
        ];

        for (i, sym) in expected_symbols.iter().enumerate() {
            global.define_builtin(i, &sym.name);
        }

        let first_local = SymbolTable::new_enclosed_symbol_table(Box::new(global.clone()));
        let second_local = SymbolTable::new_enclosed_symbol_table(Box::new(first_local.clone()));

        for table in &mut [global, first_local, second_local] {
            for sym in expected_symbols.iter() {
                let actual = table.resolve(&sym.name).unwrap();
                assert_eq!(&*actual, sym);
            }
        }
    }

    #[test]
    fn test_define_and_resolve_function_name() {
        let mut global = SymbolTable::new();
        global.define_function_name("a");

        let res = global.resolve("a").unwrap();
        assert_eq!(&*res, &symbol("a", FunctionScope, 0));
    }

    #[test]
    fn test_shadowing_function_name() {
        let mut global = SymbolTable::new();
        global.define_function_name("a");
        global.define("a");

        let res = global.resolve("a").unwrap();
        assert_eq!(&*res, &symbol("a", GlobalScope, 0));
    }
}
