//! Method descriptor parsing and class-name forms
//!
//! Descriptors use the compact notation emitted by instrumented call sites:
//!
//! ```text
//! (ILstd/String;[J)Z     params: int, std.String, long[]   returns: boolean
//! ```
//!
//! Class names travel in internal form (`demo/Greeter`); resolved types and
//! class-table keys use the canonical dotted form (`demo.Greeter`).

use std::sync::Arc;

use dashmap::DashMap;
use mimic_sdk::{MockError, MockResult, Primitive, Type};

/// Capability to resolve a canonical class name into a type
pub trait TypeResolver {
    /// Resolve `canonical`, failing with `TypeNotFound` when it is unknown
    fn resolve_type(&self, canonical: &str) -> MockResult<Type>;
}

/// A parsed (not yet resolved) method descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter types in declaration order
    pub params: Vec<Type>,
    /// Return type
    pub ret: Type,
}

/// Convert an internal class name (`a/b/C`) to canonical form (`a.b.C`).
///
/// Pure string transform; idempotent.
pub fn canonicalize(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Convert a canonical class name back to internal form
pub fn internalize(canonical: &str) -> String {
    canonical.replace('.', "/")
}

/// Parse a full method descriptor without resolving class names
pub fn parse_method_descriptor(descriptor: &str) -> MockResult<MethodDescriptor> {
    let mut parser = Parser::new(descriptor);
    parser.expect('(')?;

    let mut params = Vec::new();
    while parser.peek() != Some(')') {
        if parser.peek().is_none() {
            return Err(parser.error("unterminated parameter list"));
        }
        let ty = parser.parse_type()?;
        if ty == Type::Void {
            return Err(parser.error("void is not a parameter type"));
        }
        params.push(ty);
    }
    parser.expect(')')?;

    let ret = parser.parse_type()?;
    if !parser.at_end() {
        return Err(parser.error("trailing characters after return type"));
    }
    Ok(MethodDescriptor { params, ret })
}

/// Parse only the return type of a method descriptor.
///
/// No class resolution takes place; named types keep their canonical name.
pub fn parse_return_type(descriptor: &str) -> MockResult<Type> {
    parse_method_descriptor(descriptor).map(|desc| desc.ret)
}

/// Parse the parameter types of `descriptor`, resolving every named type
/// through `resolver`.
pub fn parse_parameter_types(
    descriptor: &str,
    resolver: &dyn TypeResolver,
) -> MockResult<Vec<Type>> {
    parse_method_descriptor(descriptor)?
        .params
        .into_iter()
        .map(|ty| resolve(ty, resolver))
        .collect()
}

fn resolve(ty: Type, resolver: &dyn TypeResolver) -> MockResult<Type> {
    match ty {
        Type::Class(name) => resolver.resolve_type(&name),
        Type::Array(element) => Ok(Type::array_of(resolve(*element, resolver)?)),
        other => Ok(other),
    }
}

/// Encode parameter and return types as a method descriptor
pub fn encode_method_descriptor(params: &[Type], ret: &Type) -> String {
    let mut out = mimic_sdk::params_descriptor(params);
    ret.write_descriptor(&mut out);
    out
}

/// Deepest array nesting a descriptor may declare
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

struct Parser<'a> {
    descriptor: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            descriptor,
            chars: descriptor.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn error(&self, reason: &str) -> MockError {
        MockError::InvalidDescriptor {
            descriptor: self.descriptor.to_string(),
            reason: reason.to_string(),
        }
    }

    fn expect(&mut self, expected: char) -> MockResult<()> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(self.error(&format!(
                "expected '{}' at {}, found '{}'",
                expected, pos, c
            ))),
            None => Err(self.error(&format!("expected '{}', found end", expected))),
        }
    }

    fn parse_type(&mut self) -> MockResult<Type> {
        let mut dimensions = 0usize;
        while self.peek() == Some('[') {
            self.chars.next();
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(self.error(&format!(
                    "more than {} array dimensions",
                    MAX_ARRAY_DIMENSIONS
                )));
            }
        }

        let element = self.parse_element()?;
        if dimensions == 0 {
            return Ok(element);
        }
        if element == Type::Void {
            return Err(self.error("array of void"));
        }
        Ok((0..dimensions).fold(element, |ty, _| Type::array_of(ty)))
    }

    fn parse_element(&mut self) -> MockResult<Type> {
        let Some((pos, c)) = self.chars.next() else {
            return Err(self.error("expected a type, found end"));
        };
        match c {
            'V' => Ok(Type::Void),
            'L' => {
                let start = pos + 1;
                loop {
                    match self.chars.next() {
                        Some((end, ';')) => {
                            let internal = &self.descriptor[start..end];
                            if internal.is_empty() {
                                return Err(self.error("empty class name"));
                            }
                            return Ok(Type::class(canonicalize(internal)));
                        }
                        Some(_) => {}
                        None => return Err(self.error("unterminated class name")),
                    }
                }
            }
            other => Primitive::from_descriptor_char(other)
                .map(Type::Primitive)
                .ok_or_else(|| self.error(&format!("unknown type code '{}' at {}", other, pos))),
        }
    }
}

/// Parsed parameter lists, keyed by descriptor.
///
/// Parsing and resolution happen once per distinct descriptor; later calls
/// reuse the shared slice.
#[derive(Debug)]
pub struct DescriptorCache {
    enabled: bool,
    parsed: DashMap<String, Arc<[Type]>>,
}

impl DescriptorCache {
    /// Create a cache; a disabled cache parses on every call
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            parsed: DashMap::new(),
        }
    }

    /// Resolved parameter types for `descriptor`
    pub fn parameter_types(
        &self,
        descriptor: &str,
        resolver: &dyn TypeResolver,
    ) -> MockResult<Arc<[Type]>> {
        if self.enabled {
            if let Some(hit) = self.parsed.get(descriptor) {
                return Ok(Arc::clone(hit.value()));
            }
        }

        let params: Arc<[Type]> = parse_parameter_types(descriptor, resolver)?.into();
        if self.enabled {
            self.parsed
                .insert(descriptor.to_string(), Arc::clone(&params));
        }
        Ok(params)
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_sdk::builtin;

    /// Resolves built-ins and anything under `demo.`
    struct DemoResolver;

    impl TypeResolver for DemoResolver {
        fn resolve_type(&self, canonical: &str) -> MockResult<Type> {
            if builtin::is_builtin(canonical) || canonical.starts_with("demo.") {
                Ok(Type::class(canonical))
            } else {
                Err(MockError::TypeNotFound(canonical.to_string()))
            }
        }
    }

    #[test]
    fn test_parse_primitives_and_refs() {
        let desc = parse_method_descriptor("(ILstd/String;[J)Z").unwrap();
        assert_eq!(
            desc.params,
            vec![
                Type::Primitive(Primitive::Int),
                Type::string(),
                Type::array_of(Type::Primitive(Primitive::Long)),
            ]
        );
        assert_eq!(desc.ret, Type::Primitive(Primitive::Boolean));
    }

    #[test]
    fn test_parse_empty_params() {
        let desc = parse_method_descriptor("()V").unwrap();
        assert!(desc.params.is_empty());
        assert_eq!(desc.ret, Type::Void);
    }

    #[test]
    fn test_malformed_descriptors() {
        for bad in ["", "I)V", "(I", "(I)", "(Q)V", "(V)V", "(L;)V", "(Ldemo/X)V", "(I)VV", "([V)V"] {
            assert!(
                matches!(
                    parse_method_descriptor(bad),
                    Err(MockError::InvalidDescriptor { .. })
                ),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_array_dimension_limit() {
        let deepest = format!("({}I)V", "[".repeat(MAX_ARRAY_DIMENSIONS));
        let mut ty = parse_method_descriptor(&deepest).unwrap().params.remove(0);
        let mut depth = 0;
        while let Type::Array(element) = ty {
            ty = *element;
            depth += 1;
        }
        assert_eq!(depth, MAX_ARRAY_DIMENSIONS);
        assert_eq!(ty, Type::Primitive(Primitive::Int));

        let too_deep = format!("({}I)V", "[".repeat(MAX_ARRAY_DIMENSIONS + 1));
        assert!(matches!(
            parse_method_descriptor(&too_deep),
            Err(MockError::InvalidDescriptor { .. })
        ));

        let hostile = format!("({}I)V", "[".repeat(2_000_000));
        assert!(matches!(
            parse_method_descriptor(&hostile),
            Err(MockError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_parameter_types_resolve_through_resolver() {
        let params =
            parse_parameter_types("(Lmimic/Invocation;Ldemo/Greeter;)V", &DemoResolver).unwrap();
        assert!(params[0].is_invocation());
        assert_eq!(params[1], Type::class("demo.Greeter"));

        let err = parse_parameter_types("(Lother/Thing;)V", &DemoResolver).unwrap_err();
        assert!(matches!(err, MockError::TypeNotFound(name) if name == "other.Thing"));

        let err = parse_parameter_types("([Lother/Thing;)V", &DemoResolver).unwrap_err();
        assert!(matches!(err, MockError::TypeNotFound(_)));
    }

    #[test]
    fn test_return_type_needs_no_resolution() {
        assert_eq!(
            parse_return_type("()Lother/Thing;").unwrap(),
            Type::class("other.Thing")
        );
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(canonicalize("demo/inner/Greeter"), "demo.inner.Greeter");
        assert_eq!(canonicalize("demo.Greeter"), "demo.Greeter");
        assert_eq!(internalize("demo.inner.Greeter"), "demo/inner/Greeter");
    }

    #[test]
    fn test_encode() {
        let params = vec![Type::invocation(), Type::Primitive(Primitive::Double)];
        assert_eq!(
            encode_method_descriptor(&params, &Type::Void),
            "(Lmimic/Invocation;D)V"
        );
    }

    #[test]
    fn test_cache_reuses_parse() {
        let cache = DescriptorCache::default();
        let a = cache.parameter_types("(IZ)V", &DemoResolver).unwrap();
        let b = cache.parameter_types("(IZ)V", &DemoResolver).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let uncached = DescriptorCache::new(false);
        uncached.parameter_types("(IZ)V", &DemoResolver).unwrap();
        assert!(uncached.is_empty());
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache = DescriptorCache::default();
        assert!(cache.parameter_types("(Lother/X;)V", &DemoResolver).is_err());
        assert!(cache.is_empty());
    }
}
