// vim: tw=80
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    *,
    parse::{Parse, ParseStream},
    spanned::Spanned
};

/// `#[mockable]` attributes
#[derive(Debug, Default)]
pub(crate) struct Attrs {
    /// Arity of the interface's constructor, if it has one.
    constructor: Option<LitInt>,
}

impl Parse for Attrs {
    fn parse(input: ParseStream) -> parse::Result<Self> {
        let mut attrs = Attrs::default();
        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(Ident) {
                let key: Ident = input.parse()?;
                if key != "constructor" {
                    return Err(Error::new(key.span(),
                        "unknown mockable attribute"));
                }
                input.parse::<Token![=]>()?;
                attrs.constructor = Some(input.parse()?);
            } else {
                return Err(lookahead.error());
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(attrs)
    }
}

/// One method of the mockable trait.
struct MockableMethod {
    sig: Signature,
    args: Vec<Ident>,
    /// Does the method report failures through a `Result`?
    fallible: bool,
}

impl MockableMethod {
    fn new(sig: &Signature) -> Result<Self> {
        match sig.receiver() {
            None => return Err(Error::new(sig.span(),
                "mockable methods must take self by reference")),
            Some(r) if r.reference.is_none() => return Err(Error::new(
                r.span(), "mockable methods may not take self by value")),
            Some(_) => ()
        }
        if sig.generics.type_params().next().is_some() ||
            sig.generics.const_params().next().is_some()
        {
            return Err(Error::new(sig.generics.span(),
                "mockable methods may not be generic"));
        }
        if let Some(a) = &sig.asyncness {
            return Err(Error::new(a.span(),
                "mockable methods may not be async"));
        }
        let mut args = Vec::new();
        for input in sig.inputs.iter() {
            if let FnArg::Typed(pt) = input {
                match pt.pat.as_ref() {
                    Pat::Ident(pi) if pi.subpat.is_none() =>
                        args.push(pi.ident.clone()),
                    pat => return Err(Error::new(pat.span(),
                        "mockable method arguments must be plain identifiers"))
                }
            }
        }
        Ok(MockableMethod {
            sig: sig.clone(),
            args,
            fallible: returns_result(&sig.output)
        })
    }

    fn decl(&self) -> TokenStream {
        let name = self.sig.ident.to_string();
        let arity = self.args.len();
        quote!(.method(#name, #arity))
    }

    fn gen(&self) -> TokenStream {
        let sig = &self.sig;
        let name = self.sig.ident.to_string();
        let args = &self.args;
        let call = quote!(
            ::testdouble::MockObject::call(self, #name,
                ::std::vec![#(::testdouble::Value::from(#args)),*])
            .and_then(::testdouble::FromValue::from_value)
        );
        let body = if self.fallible {
            quote!(#call.map_err(::std::convert::Into::into))
        } else {
            quote!(
                match #call {
                    ::std::result::Result::Ok(v) => v,
                    ::std::result::Result::Err(e) => panic!("{}", e)
                }
            )
        };
        quote!(#sig { #body })
    }
}

/// Is the return type spelled as some kind of `Result`?
fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(tp) => tp.path.segments.last()
                .map_or(false, |seg| seg.ident == "Result"),
            _ => false
        },
        ReturnType::Default => false
    }
}

struct Mockable {
    item: ItemTrait,
    attrs: Attrs,
    methods: Vec<MockableMethod>,
}

impl Mockable {
    fn new(attrs: Attrs, item: ItemTrait) -> Result<Self> {
        let mut errors = Vec::new();
        if !item.generics.params.is_empty() {
            errors.push(Error::new(item.generics.span(),
                "mockable traits may not be generic"));
        }
        let mut methods = Vec::new();
        for ti in item.items.iter() {
            match ti {
                TraitItem::Fn(f) => match MockableMethod::new(&f.sig) {
                    Ok(m) => methods.push(m),
                    Err(e) => errors.push(e)
                },
                TraitItem::Type(t) => errors.push(Error::new(t.span(),
                    "mockable traits may not have associated types")),
                TraitItem::Const(c) => errors.push(Error::new(c.span(),
                    "mockable traits may not have associated constants")),
                _ => ()
            }
        }
        // Report every problem at once
        let mut errors = errors.into_iter();
        match errors.next() {
            Some(mut e) => {
                for other in errors {
                    e.combine(other);
                }
                Err(e)
            },
            None => Ok(Mockable { item, attrs, methods })
        }
    }

    fn gen(&self) -> TokenStream {
        let ident = &self.item.ident;
        let vis = &self.item.vis;
        let iface = ident.to_string();
        let mock_ident = format_ident!("Mock{}", ident);
        let decls = self.methods.iter().map(MockableMethod::decl);
        let ctor = self.attrs.constructor.as_ref()
            .map(|n| quote!(.constructor(#n)));
        let methods = self.methods.iter().map(MockableMethod::gen);
        let doc = format!("Mock implementation of [`{}`]", iface);
        quote!(
            impl ::testdouble::Interface for dyn #ident {
                fn descriptor() -> ::testdouble::InterfaceDescriptor {
                    ::testdouble::InterfaceDescriptor::new(#iface)
                        #(#decls)*
                        #ctor
                }
            }
            impl #ident for ::testdouble::MockObject<dyn #ident> {
                #(#methods)*
            }
            #[allow(dead_code)]
            #[doc = #doc]
            #vis type #mock_ident = ::testdouble::MockObject<dyn #ident>;
        )
    }
}

pub(crate) fn do_mockable(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    let item: ItemTrait = match parse2(input.clone()) {
        Ok(item) => item,
        Err(_) => {
            let e = Error::new(Span::call_site(),
                "#[mockable] may only be applied to traits");
            let mut output = input;
            output.extend(e.to_compile_error());
            return output;
        }
    };
    let generated = parse2::<Attrs>(attrs)
        .and_then(|attrs| Mockable::new(attrs, item.clone()))
        .map(|mockable| mockable.gen())
        .unwrap_or_else(|e| e.to_compile_error());
    quote!(#item #generated)
}

/// Test cases for `#[mockable]`.
#[cfg(test)]
mod t {
    use std::str::FromStr;
    use pretty_assertions::assert_eq;
    use super::*;

    fn check(desired: &str, attrs: &str, code: &str) {
        let attrs = TokenStream::from_str(attrs).unwrap();
        let ts = TokenStream::from_str(code).unwrap();
        let output = do_mockable(attrs, ts).to_string();
        // Let proc_macro2 reformat the whitespace in the expected string
        let expected = TokenStream::from_str(desired).unwrap()
            .to_string();
        assert_eq!(expected, output);
    }

    fn check_error(msg: &str, attrs: &str, code: &str) {
        let attrs = TokenStream::from_str(attrs).unwrap();
        let ts = TokenStream::from_str(code).unwrap();
        let output = do_mockable(attrs, ts).to_string();
        assert!(output.contains("compile_error"), "{}", output);
        assert!(output.contains(msg), "{}", output);
    }

    #[test]
    fn simple() {
        let desired = r#"
        pub trait Foo {
            fn foo(&self, x: u32) -> u32;
        }
        impl ::testdouble::Interface for dyn Foo {
            fn descriptor() -> ::testdouble::InterfaceDescriptor {
                ::testdouble::InterfaceDescriptor::new("Foo")
                    .method("foo", 1usize)
            }
        }
        impl Foo for ::testdouble::MockObject<dyn Foo> {
            fn foo(&self, x: u32) -> u32 {
                match ::testdouble::MockObject::call(self, "foo",
                    ::std::vec![::testdouble::Value::from(x)])
                    .and_then(::testdouble::FromValue::from_value)
                {
                    ::std::result::Result::Ok(v) => v,
                    ::std::result::Result::Err(e) => panic!("{}", e)
                }
            }
        }
        #[allow(dead_code)]
        #[doc = "Mock implementation of [`Foo`]"]
        pub type MockFoo = ::testdouble::MockObject<dyn Foo> ;
        "#;
        let code = r#"
        pub trait Foo {
            fn foo(&self, x: u32) -> u32;
        }"#;
        check(desired, "", code);
    }

    #[test]
    fn fallible() {
        let desired = r#"
        trait Foo {
            fn foo(&self) -> Result<(), Error>;
        }
        impl ::testdouble::Interface for dyn Foo {
            fn descriptor() -> ::testdouble::InterfaceDescriptor {
                ::testdouble::InterfaceDescriptor::new("Foo")
                    .method("foo", 0usize)
                    .constructor(2)
            }
        }
        impl Foo for ::testdouble::MockObject<dyn Foo> {
            fn foo(&self) -> Result<(), Error> {
                ::testdouble::MockObject::call(self, "foo", ::std::vec![])
                    .and_then(::testdouble::FromValue::from_value)
                    .map_err(::std::convert::Into::into)
            }
        }
        #[allow(dead_code)]
        #[doc = "Mock implementation of [`Foo`]"]
        type MockFoo = ::testdouble::MockObject<dyn Foo> ;
        "#;
        let code = r#"
        trait Foo {
            fn foo(&self) -> Result<(), Error>;
        }"#;
        check(desired, "constructor = 2", code);
    }

    #[test]
    fn static_method() {
        check_error("must take self by reference", "",
                    "trait Foo { fn new() -> u32; }");
    }

    #[test]
    fn self_by_value() {
        check_error("may not take self by value", "",
                    "trait Foo { fn consume(self) -> u32; }");
    }

    #[test]
    fn generic_method() {
        check_error("may not be generic", "",
                    "trait Foo { fn foo<T>(&self, t: T); }");
    }

    #[test]
    fn const_generic_method() {
        check_error("may not be generic", "",
                    "trait Foo { fn foo<const N: usize>(&self); }");
    }

    /// Lifetime parameters pass through to the mock's signature
    #[test]
    fn lifetime_parameter() {
        let output = do_mockable(TokenStream::new(),
            TokenStream::from_str(
                "trait Foo { fn get<'a>(&self, k: &'a str) -> u32; }"
            ).unwrap()).to_string();
        assert!(!output.contains("compile_error"), "{}", output);
        assert!(output.contains("impl Foo for"), "{}", output);
    }

    #[test]
    fn pattern_argument() {
        check_error("must be plain identifiers", "",
                    "trait Foo { fn foo(&self, (a, b): (u32, u32)); }");
    }

    #[test]
    fn associated_type() {
        check_error("may not have associated types", "",
                    "trait Foo { type T; fn foo(&self); }");
    }

    #[test]
    fn unknown_attribute() {
        check_error("unknown mockable attribute", "destructor = 1",
                    "trait Foo { fn foo(&self); }");
    }

    #[test]
    fn not_a_trait() {
        check_error("may only be applied to traits", "", "struct Foo;");
    }

    #[test]
    fn keeps_the_trait_on_error() {
        let output = do_mockable(TokenStream::new(),
            TokenStream::from_str("trait Foo { fn new(); }").unwrap());
        assert!(output.to_string().starts_with("trait Foo"));
    }
}
