use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, Result, Token, parse::Parser, punctuated::Punctuated};

use crate::tool::to_pascal_case;

pub fn tools_impl(input: TokenStream) -> Result<TokenStream> {
    let tools = Punctuated::<Ident, Token![,]>::parse_terminated.parse2(input)?;

    if tools.is_empty() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "toolset! macro requires at least one tool function",
        ));
    }

    // Same naming rule as #[tool], so these resolve to the generated wrapper structs.
    let wrapper_names: Vec<_> = tools
        .iter()
        .map(|tool_name| quote::format_ident!("{}Tool", to_pascal_case(&tool_name.to_string())))
        .collect();

    Ok(quote! {
        {
            let registry = ::chatflow::ToolRegistry::new();
            #(
                registry
                    .register(::std::sync::Arc::new(#wrapper_names))
                    .expect(concat!("Failed to register tool: ", stringify!(#wrapper_names)));
            )*

            ::chatflow::ToolSet { registry }
        }
    })
}
