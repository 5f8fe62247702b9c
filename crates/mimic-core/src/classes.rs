//! Class table for mock classes
//!
//! Mock behaviour is registered up front as an explicit table from
//! (class, method name, parameter types) to a callable. At dispatch time the
//! bridge only consults the table; nothing is discovered per call.
//!
//! The table provides the capabilities the bridge needs from a class model:
//! resolve a type by name, construct an instance through the no-argument
//! constructor, find a method along the class hierarchy and invoke it.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use mimic_sdk::{
    builtin, params_descriptor, ConstructorFn, MockError, MockMethodFn, MockResult, ObjectRef,
    Type, Value,
};

use crate::descriptor::{canonicalize, parse_method_descriptor, TypeResolver};

struct MethodEntry {
    declaring_class: Arc<str>,
    name: String,
    params: Vec<Type>,
    ret: Type,
    body: MockMethodFn,
}

/// Handle to one registered mock method
#[derive(Clone)]
pub struct MockMethod(Arc<MethodEntry>);

impl MockMethod {
    /// Canonical name of the class that declares the method
    pub fn declaring_class(&self) -> &str {
        &self.0.declaring_class
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declared parameter types
    pub fn params(&self) -> &[Type] {
        &self.0.params
    }

    /// Declared return type
    pub fn return_type(&self) -> &Type {
        &self.0.ret
    }

    /// Whether the first declared parameter is the invocation context
    pub fn takes_invocation(&self) -> bool {
        self.0.params.first().is_some_and(Type::is_invocation)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &MockMethod) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for MockMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MockMethod({}.{}{})",
            self.0.declaring_class,
            self.0.name,
            params_descriptor(&self.0.params)
        )
    }
}

/// A registered mock class
pub struct MockClass {
    name: Arc<str>,
    parent: Option<Arc<str>>,
    constructor: Option<ConstructorFn>,
    real_slot: bool,
    methods: FxHashMap<String, Vec<MockMethod>>,
}

impl MockClass {
    /// Start building a class; `name` may be internal or canonical
    pub fn builder(name: &str) -> MockClassBuilder {
        MockClassBuilder {
            name: Arc::from(canonicalize(name)),
            parent: None,
            constructor: None,
            real_slot: false,
            methods: Vec::new(),
        }
    }

    /// Canonical class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical name of the parent class, if any
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether instances carry a real-object back-reference slot
    pub fn declares_real_slot(&self) -> bool {
        self.real_slot
    }

    /// Whether the class can be instantiated without arguments
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Overloads declared directly on this class
    pub fn declared_methods(&self, name: &str) -> &[MockMethod] {
        self.methods.get(name).map_or(&[][..], Vec::as_slice)
    }
}

impl std::fmt::Debug for MockClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("has_constructor", &self.constructor.is_some())
            .field("real_slot", &self.real_slot)
            .field("methods", &self.methods.values().flatten().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`MockClass`]
pub struct MockClassBuilder {
    name: Arc<str>,
    parent: Option<Arc<str>>,
    constructor: Option<ConstructorFn>,
    real_slot: bool,
    methods: Vec<(String, String, MockMethodFn)>,
}

impl MockClassBuilder {
    /// Set the parent class (internal or canonical name)
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(Arc::from(canonicalize(parent)));
        self
    }

    /// Set the no-argument constructor
    pub fn constructor(mut self, constructor: ConstructorFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Declare the real-object back-reference slot
    pub fn real_slot(mut self) -> Self {
        self.real_slot = true;
        self
    }

    /// Declare a method by name and full descriptor
    pub fn method(mut self, name: &str, descriptor: &str, body: MockMethodFn) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), body));
        self
    }

    /// Build the class, validating every method descriptor
    pub fn build(self) -> MockResult<MockClass> {
        let mut methods: FxHashMap<String, Vec<MockMethod>> = FxHashMap::default();
        for (name, descriptor, body) in self.methods {
            let parsed = parse_method_descriptor(&descriptor)?;
            let method = MockMethod(Arc::new(MethodEntry {
                declaring_class: Arc::clone(&self.name),
                name: name.clone(),
                params: parsed.params,
                ret: parsed.ret,
                body,
            }));
            methods.entry(name).or_default().push(method);
        }

        Ok(MockClass {
            name: self.name,
            parent: self.parent,
            constructor: self.constructor,
            real_slot: self.real_slot,
            methods,
        })
    }
}

/// Registry of mock classes keyed by canonical name.
///
/// Registration takes a write lock; every dispatch-time operation only reads.
#[derive(Default)]
pub struct ClassTable {
    classes: RwLock<FxHashMap<Arc<str>, Arc<MockClass>>>,
}

impl ClassTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any class of the same name
    pub fn register(&self, class: MockClass) -> Arc<MockClass> {
        let class = Arc::new(class);
        self.classes
            .write()
            .insert(Arc::clone(&class.name), Arc::clone(&class));
        class
    }

    /// Look up a class by canonical name
    pub fn lookup(&self, canonical: &str) -> MockResult<Arc<MockClass>> {
        self.classes
            .read()
            .get(canonical)
            .cloned()
            .ok_or_else(|| MockError::ClassNotFound(canonical.to_string()))
    }

    /// Check if a class is registered
    pub fn contains(&self, canonical: &str) -> bool {
        self.classes.read().contains_key(canonical)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Construct a new instance through the class's no-argument constructor.
    ///
    /// A failing constructor's error is returned as the constructor raised it.
    pub fn construct(&self, canonical: &str) -> MockResult<ObjectRef> {
        let class = self.lookup(canonical)?;
        let constructor = class
            .constructor
            .as_ref()
            .ok_or_else(|| MockError::NoConstructor(canonical.to_string()))?;
        let state = constructor()?;
        Ok(ObjectRef::from_boxed(
            Arc::clone(&class.name),
            state,
            class.real_slot,
        ))
    }

    /// Check if `class` is `ancestor` or inherits from it
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let classes = self.classes.read();
        let mut current = Some(class);
        // Bounded by the table size so a cyclic registration cannot loop
        for _ in 0..=classes.len() {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => current = classes.get(name).and_then(|c| c.parent.as_deref()),
                None => return false,
            }
        }
        false
    }

    /// Walk `class` and its ancestors, most derived first
    fn hierarchy(&self, class: &Arc<MockClass>) -> Vec<Arc<MockClass>> {
        let classes = self.classes.read();
        let mut chain = vec![Arc::clone(class)];
        let mut parent = class.parent.clone();
        while let Some(name) = parent {
            match classes.get(&name) {
                Some(next) if !chain.iter().any(|c| Arc::ptr_eq(c, next)) => {
                    parent = next.parent.clone();
                    chain.push(Arc::clone(next));
                }
                _ => break,
            }
        }
        chain
    }

    /// Find a method by name and parameter types on `class` or its ancestors.
    ///
    /// An exact signature match anywhere in the hierarchy wins over a
    /// compatible one (e.g. a `std.Object` parameter accepting a string).
    pub fn find_method(
        &self,
        class: &Arc<MockClass>,
        name: &str,
        params: &[Type],
    ) -> Option<MockMethod> {
        let chain = self.hierarchy(class);
        let candidates = || chain.iter().flat_map(|c| c.declared_methods(name));

        if let Some(exact) = candidates().find(|m| m.params() == params) {
            return Some(exact.clone());
        }
        candidates()
            .find(|m| self.params_compatible(m.params(), params))
            .cloned()
    }

    fn params_compatible(&self, declared: &[Type], requested: &[Type]) -> bool {
        declared.len() == requested.len()
            && declared
                .iter()
                .zip(requested)
                .all(|(d, r)| self.type_compatible(d, r))
    }

    fn type_compatible(&self, declared: &Type, requested: &Type) -> bool {
        match (declared, requested) {
            _ if declared == requested => true,
            (Type::Class(d), r) if &**d == builtin::OBJECT => r.is_reference(),
            (Type::Class(d), Type::Class(r)) => self.is_subclass_of(r, d),
            (Type::Array(d), Type::Array(r)) => self.type_compatible(d, r),
            _ => false,
        }
    }

    /// Invoke a located method on `receiver`.
    ///
    /// Arguments are checked against the declared parameters; the body's own
    /// result, success or failure, is returned untouched.
    pub fn invoke_method(
        &self,
        receiver: &Value,
        method: &MockMethod,
        args: &[Value],
    ) -> MockResult<Value> {
        let params = method.params();
        if params.len() != args.len() {
            return Err(MockError::ArgumentCount {
                expected: params.len(),
                got: args.len(),
            });
        }
        if let Some((param, arg)) = params.iter().zip(args).find(|(p, a)| !p.accepts(a)) {
            return Err(MockError::TypeMismatch {
                expected: param.to_string(),
                got: arg.type_name().to_string(),
            });
        }
        (method.0.body)(receiver, args)
    }

    /// Find a method by name and signature on `class`, then invoke it
    pub fn invoke_by_name(
        &self,
        class: &Arc<MockClass>,
        receiver: &Value,
        name: &str,
        params: &[Type],
        args: &[Value],
    ) -> MockResult<Value> {
        let method =
            self.find_method(class, name, params)
                .ok_or_else(|| MockError::MethodNotFound {
                    class: class.name().to_string(),
                    name: name.to_string(),
                    descriptor: params_descriptor(params),
                })?;
        self.invoke_method(receiver, &method, args)
    }
}

impl TypeResolver for ClassTable {
    fn resolve_type(&self, canonical: &str) -> MockResult<Type> {
        if builtin::is_builtin(canonical) || self.contains(canonical) {
            Ok(Type::class(canonical))
        } else {
            Err(MockError::TypeNotFound(canonical.to_string()))
        }
    }
}

impl std::fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassTable")
            .field("classes", &self.classes.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_sdk::{constructor_fn, method_fn, Primitive};

    fn greeter() -> MockClass {
        MockClass::builder("demo/Greeter")
            .constructor(constructor_fn(|| Ok(String::from("hi"))))
            .method(
                "greet",
                "(Lstd/String;)Lstd/String;",
                method_fn(|mock, args| {
                    let prefix = mock
                        .as_object()
                        .and_then(|o| o.downcast_ref::<String>().cloned())
                        .unwrap_or_default();
                    let name = args[0].as_str().unwrap_or("nobody");
                    Ok(Value::string(format!("{} {}", prefix, name)))
                }),
            )
            .method(
                "greet",
                "(I)Lstd/String;",
                method_fn(|_, args| Ok(Value::string(format!("#{:?}", args[0])))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let table = ClassTable::new();
        table.register(greeter());
        assert!(table.contains("demo.Greeter"));
        assert_eq!(table.len(), 1);
        assert!(matches!(
            table.lookup("demo.Missing"),
            Err(MockError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_construct() {
        let table = ClassTable::new();
        table.register(greeter());
        let a = table.construct("demo.Greeter").unwrap();
        let b = table.construct("demo.Greeter").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.class_name(), "demo.Greeter");
        assert!(!a.has_real_slot());
    }

    #[test]
    fn test_construct_failures() {
        let table = ClassTable::new();
        table.register(MockClass::builder("demo/NoCtor").build().unwrap());
        table.register(
            MockClass::builder("demo/Failing")
                .constructor(constructor_fn::<(), _>(|| Err(MockError::raise("ctor failed"))))
                .build()
                .unwrap(),
        );

        assert!(matches!(
            table.construct("demo.Unknown"),
            Err(MockError::ClassNotFound(_))
        ));
        assert!(matches!(
            table.construct("demo.NoCtor"),
            Err(MockError::NoConstructor(_))
        ));
        let err = table.construct("demo.Failing").unwrap_err();
        assert!(err.is_raised());
        assert_eq!(err.to_string(), "ctor failed");
    }

    #[test]
    fn test_overload_resolution() {
        let table = ClassTable::new();
        let class = table.register(greeter());
        let receiver = Value::Object(table.construct("demo.Greeter").unwrap());

        let by_string = table
            .invoke_by_name(&class, &receiver, "greet", &[Type::string()], &[Value::string("Ann")])
            .unwrap();
        assert_eq!(by_string, Value::string("hi Ann"));

        let by_int = table
            .invoke_by_name(
                &class,
                &receiver,
                "greet",
                &[Type::Primitive(Primitive::Int)],
                &[Value::Int(4)],
            )
            .unwrap();
        assert_eq!(by_int, Value::string("#Int(4)"));

        let missing = table.invoke_by_name(&class, &receiver, "greet", &[], &[]);
        assert!(matches!(missing, Err(MockError::MethodNotFound { .. })));
    }

    #[test]
    fn test_hierarchy_lookup() {
        let table = ClassTable::new();
        table.register(
            MockClass::builder("demo/Base")
                .method("describe", "(Lstd/Object;)I", method_fn(|_, _| Ok(Value::Int(1))))
                .build()
                .unwrap(),
        );
        let child = table.register(
            MockClass::builder("demo/Child")
                .extends("demo/Base")
                .build()
                .unwrap(),
        );

        assert!(table.is_subclass_of("demo.Child", "demo.Base"));
        assert!(!table.is_subclass_of("demo.Base", "demo.Child"));

        // Found on the parent through a compatible (Object) parameter
        let method = table.find_method(&child, "describe", &[Type::string()]).unwrap();
        assert_eq!(method.declaring_class(), "demo.Base");
        assert!(table.find_method(&child, "describe", &[Type::Primitive(Primitive::Int)]).is_none());
    }

    #[test]
    fn test_invoke_checks_arguments() {
        let table = ClassTable::new();
        let class = table.register(greeter());
        let method = table
            .find_method(&class, "greet", &[Type::Primitive(Primitive::Int)])
            .unwrap();

        let err = table.invoke_method(&Value::Null, &method, &[]).unwrap_err();
        assert!(matches!(err, MockError::ArgumentCount { expected: 1, got: 0 }));

        let err = table
            .invoke_method(&Value::Null, &method, &[Value::string("x")])
            .unwrap_err();
        assert!(matches!(err, MockError::TypeMismatch { .. }));
    }

    #[test]
    fn test_invalid_method_descriptor_rejected() {
        let result = MockClass::builder("demo/Bad")
            .method("m", "(I", method_fn(|_, _| Ok(Value::Null)))
            .build();
        assert!(matches!(result, Err(MockError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_type_resolution() {
        let table = ClassTable::new();
        table.register(greeter());
        assert_eq!(table.resolve_type("demo.Greeter").unwrap(), Type::class("demo.Greeter"));
        assert_eq!(table.resolve_type(builtin::STRING).unwrap(), Type::string());
        assert!(table.resolve_type("demo.Missing").is_err());
    }
}
