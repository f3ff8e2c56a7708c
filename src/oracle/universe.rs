//! In-memory type system built from declaration documents.
//!
//! Types are interned into `TypeId` handles. Generic instantiations, alias
//! expansions and member lists are materialized lazily on first request, so
//! recursive declarations never expand more than once.
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use super::doc::{
    AliasDoc, DeclarationDoc, DeclarationFile, IndexDoc, MemberDoc, SourceUnit, TypeExpr,
};
use super::{DeclKind, Declaration, IndexSignature, Member, SymbolId, TypeOracle};
use crate::error::LoadError;
use crate::schema::Literal;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Handle of an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Intrinsic {
    String,
    Number,
    Boolean,
    BigInt,
    Null,
    Undefined,
    Any,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Builtin {
    Array,
    Date,
    RegExp,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AliasRef {
    symbol: SymbolId,
    args: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeData {
    Intrinsic(Intrinsic),
    Literal(Literal),
    /// Unknown name, or an alias that expands into itself.
    Unresolved(String),
    Param(SymbolId),
    Array(TypeId),
    /// Nominal: interfaces, enums, `Date`, `RegExp`.
    Reference { symbol: SymbolId, args: Vec<TypeId> },
    Union { branches: Vec<TypeId>, alias: Option<AliasRef> },
    /// Structural; every object gets its own slot and identity.
    Object(usize),
}

#[derive(Debug, Clone)]
struct Scope {
    unit: usize,
    params: Vec<(String, TypeId)>,
}

#[derive(Debug, Clone)]
enum Shape {
    Literal { members: Vec<MemberDoc>, indexes: Vec<IndexDoc>, scope: Scope },
    Intersection(Vec<TypeId>),
    Record { key: TypeId, value: TypeId },
}

#[derive(Debug, Clone)]
struct ObjectData {
    symbol: SymbolId,
    alias: Option<AliasRef>,
    shape: Shape,
}

#[derive(Debug, Clone)]
enum SymbolData {
    Decl { unit: usize, index: usize },
    Builtin(Builtin),
    Param(String),
    Anonymous,
}

#[derive(Debug, Default)]
struct Interner {
    symbols: Vec<SymbolData>,
    types: Vec<TypeData>,
    lookup: HashMap<TypeData, TypeId>,
    objects: Vec<ObjectData>,
    instances: HashMap<AliasRef, TypeId>,
    expanding: Vec<AliasRef>,
    members: HashMap<TypeId, Vec<Member<TypeId>>>,
    indexes: HashMap<TypeId, Vec<IndexSignature<TypeId>>>,
}

/// A resolved type system over a set of source units.
#[derive(Debug)]
pub struct TypeUniverse {
    units: Vec<SourceUnit>,
    decl_symbols: Vec<Vec<SymbolId>>,
    decl_params: HashMap<SymbolId, Vec<TypeId>>,
    by_name: HashMap<String, Vec<(usize, SymbolId)>>,
    builtins: HashMap<Builtin, SymbolId>,
    state: RefCell<Interner>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl Intrinsic {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Any => "any",
            Self::Unknown => "unknown",
        }
    }
}

impl Builtin {
    const ALL: [Builtin; 4] = [Builtin::Array, Builtin::Date, Builtin::RegExp, Builtin::Record];

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Date => "Date",
            Self::RegExp => "RegExp",
            Self::Record => "Record",
        }
    }
}

impl TypeUniverse {
    pub fn new(units: Vec<SourceUnit>) -> Result<Self, LoadError> {
        let mut state = Interner::default();
        let mut builtins = HashMap::new();
        for b in Builtin::ALL {
            builtins.insert(b, state.new_symbol(SymbolData::Builtin(b)));
        }

        let mut decl_symbols = Vec::with_capacity(units.len());
        let mut decl_params = HashMap::new();
        let mut by_name: HashMap<String, Vec<(usize, SymbolId)>> = HashMap::new();
        for (u, unit) in units.iter().enumerate() {
            let mut symbols = Vec::with_capacity(unit.declarations.len());
            for (i, decl) in unit.declarations.iter().enumerate() {
                let entry = by_name.entry(decl.name().to_string()).or_default();
                if entry.iter().any(|(owner, _)| *owner == u) {
                    return Err(LoadError::DuplicateDeclaration {
                        name: decl.name().to_string(),
                        file: unit.file.clone(),
                    });
                }
                let symbol = state.new_symbol(SymbolData::Decl { unit: u, index: i });
                entry.push((u, symbol));
                if !decl.type_params().is_empty() {
                    let params = decl
                        .type_params()
                        .iter()
                        .map(|p| {
                            let ps = state.new_symbol(SymbolData::Param(p.clone()));
                            state.intern(TypeData::Param(ps))
                        })
                        .collect();
                    decl_params.insert(symbol, params);
                }
                symbols.push(symbol);
            }
            decl_symbols.push(symbols);
        }
        debug!(units = units.len(), "type universe loaded");

        Ok(Self {
            units,
            decl_symbols,
            decl_params,
            by_name,
            builtins,
            state: RefCell::new(state),
        })
    }

    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        let file: DeclarationFile = crate::path_de::from_str_with_path(src)?;
        Self::new(file.into_units())
    }

    /// Load and merge several declaration files, in order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let mut units = Vec::new();
        for path in paths {
            let file: DeclarationFile = crate::path_de::from_file_with_path(path.as_ref())?;
            units.extend(file.into_units());
        }
        Self::new(units)
    }

    /// The type of the declaration called `name` (generic parameters unbound).
    pub fn declared(&self, name: &str) -> Option<TypeId> {
        let symbol = self.find_decl(name, 0)?;
        Some(self.instantiate(symbol, Vec::new()))
    }
}

impl Interner {
    fn new_symbol(&mut self, data: SymbolData) -> SymbolId {
        self.symbols.push(data);
        SymbolId((self.symbols.len() - 1) as u32)
    }

    fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(id) = self.lookup.get(&data) {
            return *id;
        }
        let id = self.reserve();
        self.types[id.index()] = data.clone();
        self.lookup.insert(data, id);
        id
    }

    fn reserve(&mut self) -> TypeId {
        self.types.push(TypeData::Unresolved(String::new()));
        TypeId((self.types.len() - 1) as u32)
    }

    fn new_object(
        &mut self,
        slot: Option<TypeId>,
        alias: Option<AliasRef>,
        shape: Shape,
    ) -> TypeId {
        let symbol = self.new_symbol(SymbolData::Anonymous);
        self.objects.push(ObjectData { symbol, alias, shape });
        let id = slot.unwrap_or_else(|| self.reserve());
        self.types[id.index()] = TypeData::Object(self.objects.len() - 1);
        id
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLUTION
// ————————————————————————————————————————————————————————————————————————————

impl TypeUniverse {
    fn intern(&self, data: TypeData) -> TypeId {
        self.state.borrow_mut().intern(data)
    }

    fn data(&self, ty: TypeId) -> TypeData {
        self.state.borrow().types[ty.index()].clone()
    }

    fn object(&self, index: usize) -> ObjectData {
        self.state.borrow().objects[index].clone()
    }

    fn symbol_data(&self, symbol: SymbolId) -> SymbolData {
        self.state.borrow().symbols[symbol.0 as usize].clone()
    }

    fn decl(&self, unit: usize, index: usize) -> &DeclarationDoc {
        &self.units[unit].declarations[index]
    }

    fn find_decl(&self, name: &str, unit: usize) -> Option<SymbolId> {
        let candidates = self.by_name.get(name)?;
        candidates
            .iter()
            .find(|(owner, _)| *owner == unit)
            .or_else(|| candidates.first())
            .map(|(_, symbol)| *symbol)
    }

    fn resolve(&self, expr: &TypeExpr, scope: &Scope) -> TypeId {
        match expr {
            TypeExpr::Name(name) => self.resolve_name(name, &[], scope),
            TypeExpr::Generic { name, args } => self.resolve_name(name, args, scope),
            TypeExpr::Array { array } => {
                let element = self.resolve(array, scope);
                self.intern(TypeData::Array(element))
            }
            TypeExpr::Union { union } => {
                let branches = union.iter().map(|t| self.resolve(t, scope)).collect();
                self.intern(TypeData::Union { branches, alias: None })
            }
            TypeExpr::Intersection { intersection } => {
                let parts = intersection.iter().map(|t| self.resolve(t, scope)).collect();
                self.state
                    .borrow_mut()
                    .new_object(None, None, Shape::Intersection(parts))
            }
            TypeExpr::Literal { literal } => self.intern(TypeData::Literal(literal.clone())),
            TypeExpr::Object { object } => self.state.borrow_mut().new_object(
                None,
                None,
                Shape::Literal {
                    members: object.members.clone(),
                    indexes: object.indexes.clone(),
                    scope: scope.clone(),
                },
            ),
        }
    }

    fn resolve_name(&self, name: &str, args: &[TypeExpr], scope: &Scope) -> TypeId {
        if args.is_empty() {
            if let Some((_, param)) = scope.params.iter().find(|(p, _)| p == name) {
                return *param;
            }
        }
        if let Some(intrinsic) = Intrinsic::from_name(name) {
            return self.intern(TypeData::Intrinsic(intrinsic));
        }
        match name {
            "true" => return self.intern(TypeData::Literal(Literal::Bool(true))),
            "false" => return self.intern(TypeData::Literal(Literal::Bool(false))),
            _ => {}
        }
        let args: Vec<TypeId> = args.iter().map(|a| self.resolve(a, scope)).collect();
        if let Some(symbol) = self.find_decl(name, scope.unit) {
            return self.instantiate(symbol, args);
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return self.builtin(builtin, args);
        }
        warn!(name, file = %self.units[scope.unit].file, "unresolved type name");
        self.intern(TypeData::Unresolved(name.to_string()))
    }

    fn builtin(&self, builtin: Builtin, args: Vec<TypeId>) -> TypeId {
        let unknown = || self.intern(TypeData::Intrinsic(Intrinsic::Unknown));
        match builtin {
            Builtin::Array => {
                let element = args.first().copied().unwrap_or_else(unknown);
                self.intern(TypeData::Array(element))
            }
            Builtin::Date | Builtin::RegExp => self.intern(TypeData::Reference {
                symbol: self.builtins[&builtin],
                args: Vec::new(),
            }),
            Builtin::Record => {
                let key = args
                    .first()
                    .copied()
                    .unwrap_or_else(|| self.intern(TypeData::Intrinsic(Intrinsic::String)));
                let value = args.get(1).copied().unwrap_or_else(unknown);
                let alias = AliasRef { symbol: self.builtins[&builtin], args: vec![key, value] };
                if let Some(id) = self.state.borrow().instances.get(&alias) {
                    return *id;
                }
                let mut state = self.state.borrow_mut();
                let id = state.new_object(None, Some(alias.clone()), Shape::Record { key, value });
                state.instances.insert(alias, id);
                id
            }
        }
    }

    /// Apply `args` to the declaration behind `symbol`. Missing arguments are
    /// filled with the declaration's own parameters.
    fn instantiate(&self, symbol: SymbolId, mut args: Vec<TypeId>) -> TypeId {
        let SymbolData::Decl { unit, index } = self.symbol_data(symbol) else {
            return self.intern(TypeData::Reference { symbol, args });
        };
        let params = self.decl_params.get(&symbol).cloned().unwrap_or_default();
        args.truncate(params.len());
        args.extend(params[args.len()..].iter().copied());

        match self.decl(unit, index) {
            DeclarationDoc::Interface(_) | DeclarationDoc::Enum(_) => {
                self.intern(TypeData::Reference { symbol, args })
            }
            DeclarationDoc::Alias(alias) => {
                self.expand_alias(alias, unit, AliasRef { symbol, args })
            }
        }
    }

    fn expand_alias(&self, alias: &AliasDoc, unit: usize, instance: AliasRef) -> TypeId {
        if let Some(id) = self.state.borrow().instances.get(&instance) {
            return *id;
        }
        let scope = Scope {
            unit,
            params: alias.type_params.iter().cloned().zip(instance.args.iter().copied()).collect(),
        };

        // Unions, objects and intersections carry the alias identity and are
        // registered before their parts resolve, so self references terminate.
        match &alias.ty {
            TypeExpr::Union { union } => {
                let slot = self.reserve_instance(&instance);
                let branches = union.iter().map(|t| self.resolve(t, &scope)).collect();
                self.state.borrow_mut().types[slot.index()] =
                    TypeData::Union { branches, alias: Some(instance) };
                slot
            }
            TypeExpr::Object { object } => {
                let slot = self.reserve_instance(&instance);
                let shape = Shape::Literal {
                    members: object.members.clone(),
                    indexes: object.indexes.clone(),
                    scope,
                };
                self.state.borrow_mut().new_object(Some(slot), Some(instance), shape)
            }
            TypeExpr::Intersection { intersection } => {
                let slot = self.reserve_instance(&instance);
                let parts = intersection.iter().map(|t| self.resolve(t, &scope)).collect();
                self.state
                    .borrow_mut()
                    .new_object(Some(slot), Some(instance), Shape::Intersection(parts))
            }
            other => {
                if self.state.borrow().expanding.contains(&instance) {
                    warn!(alias = %alias.name, "alias expands into itself");
                    return self.intern(TypeData::Unresolved(alias.name.clone()));
                }
                self.state.borrow_mut().expanding.push(instance.clone());
                let id = self.resolve(other, &scope);
                let mut state = self.state.borrow_mut();
                state.expanding.pop();
                state.instances.insert(instance, id);
                id
            }
        }
    }

    fn reserve_instance(&self, instance: &AliasRef) -> TypeId {
        let mut state = self.state.borrow_mut();
        let slot = state.reserve();
        state.instances.insert(instance.clone(), slot);
        slot
    }

    fn interface_scope(&self, unit: usize, params: &[String], args: &[TypeId]) -> Scope {
        Scope {
            unit,
            params: params.iter().cloned().zip(args.iter().copied()).collect(),
        }
    }

    fn resolve_members(&self, docs: &[MemberDoc], scope: &Scope) -> Vec<Member<TypeId>> {
        docs.iter()
            .map(|m| Member {
                name: m.name.clone(),
                optional: m.optional,
                ty: if m.method { None } else { m.ty.as_ref().map(|t| self.resolve(t, scope)) },
            })
            .collect()
    }

    fn resolve_indexes(&self, docs: &[IndexDoc], scope: &Scope) -> Vec<IndexSignature<TypeId>> {
        docs.iter()
            .map(|x| IndexSignature {
                key: self.resolve(&x.key, scope),
                value: self.resolve(&x.value, scope),
            })
            .collect()
    }

    /// String literal keys of a `Record`, when the key type is made of them.
    fn literal_keys(&self, key: TypeId) -> Option<Vec<String>> {
        let branches = match self.data(key) {
            TypeData::Union { branches, .. } => branches,
            _ => vec![key],
        };
        branches
            .into_iter()
            .map(|b| match self.data(b) {
                TypeData::Literal(Literal::Str(s)) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn compute_members(&self, ty: TypeId) -> Vec<Member<TypeId>> {
        match self.data(ty) {
            TypeData::Reference { symbol, args } => {
                let SymbolData::Decl { unit, index } = self.symbol_data(symbol) else {
                    return Vec::new();
                };
                let DeclarationDoc::Interface(decl) = self.decl(unit, index) else {
                    return Vec::new();
                };
                let scope = self.interface_scope(unit, &decl.type_params, &args);
                let mut out = self.resolve_members(&decl.members, &scope);
                for base in &decl.extends {
                    let base = self.resolve(base, &scope);
                    merge_members(&mut out, self.members(base));
                }
                out
            }
            TypeData::Object(index) => match self.object(index).shape {
                Shape::Literal { members, scope, .. } => self.resolve_members(&members, &scope),
                Shape::Intersection(parts) => {
                    let mut out = Vec::new();
                    for part in parts {
                        merge_members(&mut out, self.members(part));
                    }
                    out
                }
                Shape::Record { key, value } => self
                    .literal_keys(key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|name| Member { name, optional: false, ty: Some(value) })
                    .collect(),
            },
            _ => Vec::new(),
        }
    }

    fn compute_indexes(&self, ty: TypeId) -> Vec<IndexSignature<TypeId>> {
        match self.data(ty) {
            TypeData::Reference { symbol, args } => {
                let SymbolData::Decl { unit, index } = self.symbol_data(symbol) else {
                    return Vec::new();
                };
                let DeclarationDoc::Interface(decl) = self.decl(unit, index) else {
                    return Vec::new();
                };
                let scope = self.interface_scope(unit, &decl.type_params, &args);
                let mut out = self.resolve_indexes(&decl.indexes, &scope);
                for base in &decl.extends {
                    let base = self.resolve(base, &scope);
                    out.extend(self.index_signatures(base));
                }
                out
            }
            TypeData::Object(index) => match self.object(index).shape {
                Shape::Literal { indexes, scope, .. } => self.resolve_indexes(&indexes, &scope),
                Shape::Intersection(parts) => {
                    parts.into_iter().flat_map(|p| self.index_signatures(p)).collect()
                }
                Shape::Record { key, value } => match self.literal_keys(key) {
                    Some(_) => Vec::new(),
                    None => vec![IndexSignature { key, value }],
                },
            },
            _ => Vec::new(),
        }
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        match self.symbol_data(symbol) {
            SymbolData::Decl { unit, index } => self.decl(unit, index).name().to_string(),
            SymbolData::Builtin(b) => b.name().to_string(),
            SymbolData::Param(name) => name,
            SymbolData::Anonymous => "__type".to_string(),
        }
    }

    fn display_generic(&self, symbol: SymbolId, args: &[TypeId]) -> String {
        let name = self.symbol_name(symbol);
        if args.is_empty() {
            return name;
        }
        let args: Vec<String> = args.iter().map(|a| self.display(*a)).collect();
        format!("{name}<{}>", args.join(", "))
    }

    fn symbol_declaration(&self, symbol: SymbolId) -> Option<Declaration> {
        match self.symbol_data(symbol) {
            SymbolData::Decl { unit, index } => {
                let decl = self.decl(unit, index);
                let file = &self.units[unit].file;
                Some(Declaration {
                    name: decl.name().to_string(),
                    kind: match decl {
                        DeclarationDoc::Interface(_) => DeclKind::Interface,
                        DeclarationDoc::Alias(_) => DeclKind::Alias,
                        DeclarationDoc::Enum(_) => DeclKind::Enum,
                    },
                    location: Some(match decl.line() {
                        Some(line) => format!("{file}:{line}"),
                        None => file.clone(),
                    }),
                    builtin: false,
                })
            }
            SymbolData::Builtin(b) => Some(Declaration {
                name: b.name().to_string(),
                kind: if b == Builtin::Record { DeclKind::Alias } else { DeclKind::Interface },
                location: None,
                builtin: true,
            }),
            SymbolData::Param(_) | SymbolData::Anonymous => None,
        }
    }
}

fn merge_members(out: &mut Vec<Member<TypeId>>, more: Vec<Member<TypeId>>) {
    for m in more {
        if !out.iter().any(|o| o.name == m.name) {
            out.push(m);
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ORACLE
// ————————————————————————————————————————————————————————————————————————————

impl TypeOracle for TypeUniverse {
    type Handle = TypeId;

    fn exported_types(&self) -> Vec<TypeId> {
        let mut out = Vec::new();
        for (u, unit) in self.units.iter().enumerate() {
            for (i, decl) in unit.declarations.iter().enumerate() {
                if decl.exported() {
                    out.push(self.instantiate(self.decl_symbols[u][i], Vec::new()));
                }
            }
        }
        out
    }

    fn display(&self, ty: TypeId) -> String {
        match self.data(ty) {
            TypeData::Intrinsic(i) => i.name().to_string(),
            TypeData::Literal(lit) => lit.to_string(),
            TypeData::Unresolved(name) => name,
            TypeData::Param(symbol) => self.symbol_name(symbol),
            TypeData::Array(element) => {
                let inner = self.display(element);
                match self.data(element) {
                    TypeData::Union { alias: None, .. } => format!("({inner})[]"),
                    _ => format!("{inner}[]"),
                }
            }
            TypeData::Reference { symbol, args } => self.display_generic(symbol, &args),
            TypeData::Union { alias: Some(alias), .. } => {
                self.display_generic(alias.symbol, &alias.args)
            }
            TypeData::Union { branches, alias: None } => {
                let arms: Vec<String> = branches.iter().map(|b| self.display(*b)).collect();
                arms.join(" | ")
            }
            TypeData::Object(index) => {
                let object = self.object(index);
                if let Some(alias) = &object.alias {
                    return self.display_generic(alias.symbol, &alias.args);
                }
                match object.shape {
                    Shape::Intersection(parts) => {
                        let parts: Vec<String> = parts.iter().map(|p| self.display(*p)).collect();
                        parts.join(" & ")
                    }
                    _ => {
                        let fields: Vec<String> = self
                            .members(ty)
                            .into_iter()
                            .map(|m| {
                                let opt = if m.optional { "?" } else { "" };
                                match m.ty {
                                    Some(t) => format!("{}{opt}: {};", m.name, self.display(t)),
                                    None => format!("{}{opt}(): void;", m.name),
                                }
                            })
                            .collect();
                        if fields.is_empty() {
                            "{}".to_string()
                        } else {
                            format!("{{ {} }}", fields.join(" "))
                        }
                    }
                }
            }
        }
    }

    fn intrinsic_name(&self, ty: TypeId) -> Option<&'static str> {
        match self.data(ty) {
            TypeData::Intrinsic(i) => Some(i.name()),
            _ => None,
        }
    }

    fn literal(&self, ty: TypeId) -> Option<Literal> {
        match self.data(ty) {
            TypeData::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    fn symbol(&self, ty: TypeId) -> Option<SymbolId> {
        match self.data(ty) {
            TypeData::Param(symbol) | TypeData::Reference { symbol, .. } => Some(symbol),
            TypeData::Array(_) => Some(self.builtins[&Builtin::Array]),
            TypeData::Union { alias, .. } => alias.map(|a| a.symbol),
            TypeData::Object(index) => {
                let object = self.object(index);
                Some(object.alias.map_or(object.symbol, |a| a.symbol))
            }
            TypeData::Intrinsic(_) | TypeData::Literal(_) | TypeData::Unresolved(_) => None,
        }
    }

    fn union_branches(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        match self.data(ty) {
            TypeData::Union { branches, .. } => Some(branches),
            _ => None,
        }
    }

    fn is_enum(&self, ty: TypeId) -> bool {
        matches!(
            self.declaration(ty),
            Some(Declaration { kind: DeclKind::Enum, .. })
        )
    }

    fn array_element(&self, ty: TypeId) -> Option<TypeId> {
        match self.data(ty) {
            TypeData::Array(element) => Some(element),
            _ => None,
        }
    }

    fn type_arguments(&self, ty: TypeId) -> Vec<TypeId> {
        match self.data(ty) {
            TypeData::Array(element) => vec![element],
            TypeData::Reference { args, .. } => args,
            TypeData::Union { alias: Some(alias), .. } => alias.args,
            TypeData::Object(index) => self.object(index).alias.map(|a| a.args).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn declaration(&self, ty: TypeId) -> Option<Declaration> {
        match self.data(ty) {
            TypeData::Reference { symbol, .. } => self.symbol_declaration(symbol),
            TypeData::Union { alias: Some(alias), .. } => self.symbol_declaration(alias.symbol),
            TypeData::Object(index) => self
                .object(index)
                .alias
                .and_then(|a| self.symbol_declaration(a.symbol)),
            _ => None,
        }
    }

    fn members(&self, ty: TypeId) -> Vec<Member<TypeId>> {
        if let Some(cached) = self.state.borrow().members.get(&ty) {
            return cached.clone();
        }
        // Placeholder first: a base that (illegally) extends itself sees no members.
        self.state.borrow_mut().members.insert(ty, Vec::new());
        let members = self.compute_members(ty);
        self.state.borrow_mut().members.insert(ty, members.clone());
        members
    }

    fn index_signatures(&self, ty: TypeId) -> Vec<IndexSignature<TypeId>> {
        if let Some(cached) = self.state.borrow().indexes.get(&ty) {
            return cached.clone();
        }
        self.state.borrow_mut().indexes.insert(ty, Vec::new());
        let indexes = self.compute_indexes(ty);
        self.state.borrow_mut().indexes.insert(ty, indexes.clone());
        indexes
    }

    fn enum_values(&self, ty: TypeId) -> Vec<Literal> {
        let TypeData::Reference { symbol, .. } = self.data(ty) else {
            return Vec::new();
        };
        let SymbolData::Decl { unit, index } = self.symbol_data(symbol) else {
            return Vec::new();
        };
        let DeclarationDoc::Enum(decl) = self.decl(unit, index) else {
            return Vec::new();
        };
        let mut next = 0.0;
        decl.members
            .iter()
            .map(|m| {
                let value = m.value.clone().unwrap_or_else(|| Literal::from(next));
                if let Literal::Num(n) = &value {
                    next = n.0 + 1.0;
                }
                value
            })
            .collect()
    }

    fn is_nullable(&self, ty: TypeId) -> bool {
        fn walk(u: &TypeUniverse, ty: TypeId, seen: &mut Vec<TypeId>) -> bool {
            match u.data(ty) {
                TypeData::Intrinsic(Intrinsic::Null) => true,
                TypeData::Union { .. } if seen.contains(&ty) => false,
                TypeData::Union { branches, .. } => {
                    seen.push(ty);
                    branches.into_iter().any(|b| walk(u, b, seen))
                }
                _ => false,
            }
        }
        walk(self, ty, &mut Vec::new())
    }
}

// ------------------------------- Tests ------------------------------------ //
