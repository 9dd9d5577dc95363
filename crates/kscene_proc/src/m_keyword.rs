use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, spanned::Spanned, Data, DeriveInput, Error, Fields,
    LitStr, Token, Variant,
};

pub fn keyword_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct KeywordVariant {
    ident: syn::Ident,
    canonical: String,
    aliases: Vec<String>,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Keyword can only be derived for enums",
        ));
    };

    let variants = data
        .variants
        .iter()
        .map(parse_variant)
        .collect::<syn::Result<Vec<_>>>()?;

    let canonical = variants.iter().map(|v| &v.canonical);

    let as_str_arms = variants.iter().map(|v| {
        let ident = &v.ident;
        let keyword = &v.canonical;
        quote! { Self::#ident => #keyword, }
    });

    let try_from_arms = variants.iter().map(|v| {
        let ident = &v.ident;
        let accepted = std::iter::once(&v.canonical).chain(v.aliases.iter());
        quote! { #(#accepted)|* => Ok(Self::#ident), }
    });

    Ok(quote! {
        impl #enum_name {
            /// Canonical keywords of every variant, in declaration order.
            pub const KEYWORDS: &'static [&'static str] = &[#(#canonical),*];

            /// Returns the canonical keyword of this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(#as_str_arms)*
                }
            }
        }

        impl<'a> TryFrom<&'a str> for #enum_name {
            type Error = ::kscene_utils::KeywordParseError;
            fn try_from(value: &'a str) -> Result<Self, ::kscene_utils::KeywordParseError> {
                match value {
                    #(#try_from_arms)*
                    _ => Err(::kscene_utils::KeywordParseError {
                        input: value.to_string(),
                        expected: Self::KEYWORDS,
                    }),
                }
            }
        }

        impl ::std::str::FromStr for #enum_name {
            type Err = ::kscene_utils::KeywordParseError;
            fn from_str(value: &str) -> Result<Self, ::kscene_utils::KeywordParseError> {
                Self::try_from(value)
            }
        }

        impl ::std::fmt::Display for #enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    })
}

fn parse_variant(variant: &Variant) -> syn::Result<KeywordVariant> {
    if !matches!(variant.fields, Fields::Unit) {
        return Err(Error::new(
            variant.span(),
            "Keyword variants can't have fields",
        ));
    }

    let mut names = Vec::new();
    for attr in variant.attrs.iter().filter(|a| a.path.is_ident("keyword")) {
        let list = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
        if list.is_empty() {
            return Err(Error::new(attr.span(), "expected at least one keyword"));
        }
        names.extend(list.into_iter().map(|lit| lit.value()));
    }

    let canonical = if names.is_empty() {
        snake_case(&variant.ident.to_string())
    } else {
        names.remove(0)
    };

    Ok(KeywordVariant {
        ident: variant.ident.clone(),
        canonical,
        aliases: names,
    })
}

fn snake_case(ident: &str) -> String {
    let mut result = String::with_capacity(ident.len() + 4);
    for (i, c) in ident.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i != 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
