use std::collections::{HashMap, HashSet};

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, FnArg, ItemFn, Pat, Result, Type};

struct Parameter {
    name: String,
    ty: Type,
    description: Option<String>,
    required: bool,
}

pub fn tool_impl(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[tool] takes no arguments"));
    }

    let input = syn::parse2::<ItemFn>(item)?;
    let fn_name = &input.sig.ident;
    let fn_name_str = fn_name.to_string();

    let (description, param_descriptions) = extract_doc_comment_and_params(&input.attrs);
    let params = parse_parameters(&input.sig.inputs, &param_descriptions)?;
    validate_parameter_descriptions(&params, &param_descriptions, &input.sig)?;

    let schema = generate_parameter_schema(&params);
    let wrapper_name = quote::format_ident!("{}Tool", to_pascal_case(&fn_name_str));
    let execute_impl = generate_execute_impl(fn_name, &params, input.sig.asyncness.is_some());

    Ok(quote! {
        #input

        #[derive(Clone)]
        pub struct #wrapper_name;

        impl ::chatflow::ToolFunction for #wrapper_name {
            fn schema(&self) -> ::chatflow::Tool {
                ::chatflow::Tool {
                    name: #fn_name_str.to_string(),
                    description: #description,
                    parameters: #schema,
                    strict: Some(true),
                }
            }

            fn execute<'a>(
                &'a self,
                params: ::serde_json::Value,
            ) -> ::chatflow::BoxFuture<'a, Result<::serde_json::Value, ::chatflow::LlmError>> {
                use ::chatflow::LlmError;
                Box::pin(async move {
                    #execute_impl
                })
            }
        }
    })
}

/// Snake case function name to the PascalCase wrapper prefix.
pub(crate) fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .map(|s| {
            let mut c = s.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
            }
        })
        .collect()
}

fn extract_doc_comment_and_params(attrs: &[Attribute]) -> (TokenStream, HashMap<String, String>) {
    let doc_strings: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc")
                && let syn::Meta::NameValue(meta) = &attr.meta
                && let syn::Expr::Lit(expr_lit) = &meta.value
                && let syn::Lit::Str(lit_str) = &expr_lit.lit
            {
                return Some(lit_str.value().trim().to_string());
            }
            None
        })
        .collect();

    let mut description_lines = Vec::new();
    let mut param_descriptions = HashMap::new();

    for line in doc_strings {
        if let Some((param_name, param_desc)) = line.split_once(':') {
            let param_name = param_name.trim();
            if !param_name.is_empty()
                && param_name.chars().all(|c| c.is_alphanumeric() || c == '_')
            {
                param_descriptions.insert(param_name.to_string(), param_desc.trim().to_string());
                continue;
            }
        }

        if !line.is_empty() {
            description_lines.push(line);
        }
    }

    let description = if description_lines.is_empty() {
        quote! { None }
    } else {
        let description = description_lines.join(" ");
        quote! { Some(#description.to_string()) }
    };

    (description, param_descriptions)
}

/// Splits `Option<T>` into `(T, false)`; every other type is required.
fn unwrap_option(ty: &Type) -> (Type, bool) {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Option"
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner_ty)) = args.args.first()
    {
        return (inner_ty.clone(), false);
    }
    (ty.clone(), true)
}

fn parse_parameters(
    inputs: &syn::punctuated::Punctuated<FnArg, syn::token::Comma>,
    param_descriptions: &HashMap<String, String>,
) -> Result<Vec<Parameter>> {
    let mut params = Vec::new();

    for arg in inputs {
        match arg {
            FnArg::Receiver(_) => {
                return Err(syn::Error::new_spanned(
                    arg,
                    "tool functions cannot have self parameter",
                ));
            }
            FnArg::Typed(pat_type) => {
                let name = match &*pat_type.pat {
                    Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &pat_type.pat,
                            "only simple identifiers are supported for parameters",
                        ));
                    }
                };

                let (ty, required) = unwrap_option(&pat_type.ty);
                params.push(Parameter {
                    description: param_descriptions.get(&name).cloned(),
                    name,
                    ty,
                    required,
                });
            }
        }
    }

    Ok(params)
}

fn validate_parameter_descriptions(
    params: &[Parameter],
    param_descriptions: &HashMap<String, String>,
    sig: &syn::Signature,
) -> Result<()> {
    let actual_param_names: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();

    for docstring_param in param_descriptions.keys() {
        if !actual_param_names.contains(docstring_param.as_str()) {
            return Err(syn::Error::new_spanned(
                sig,
                format!(
                    "Parameter '{docstring_param}' found in docstring but not in function parameters"
                ),
            ));
        }
    }

    for param in params {
        if !param_descriptions.contains_key(&param.name) {
            return Err(syn::Error::new_spanned(
                sig,
                format!(
                    "Parameter '{}' is missing description in docstring. Add: '{}: description'",
                    param.name, param.name
                ),
            ));
        }
    }

    Ok(())
}

fn generate_parameter_schema(params: &[Parameter]) -> TokenStream {
    let properties = params.iter().map(|param| {
        let name = &param.name;
        let type_str = type_to_json_type(&param.ty);
        match &param.description {
            Some(desc) => quote! {
                properties.insert(#name.to_string(), ::serde_json::json!({
                    "type": #type_str,
                    "description": #desc
                }));
            },
            None => quote! {
                properties.insert(#name.to_string(), ::serde_json::json!({ "type": #type_str }));
            },
        }
    });

    let required_params = params.iter().filter(|p| p.required).map(|p| &p.name);

    quote! {
        {
            let mut properties = ::serde_json::Map::new();
            #(#properties)*

            ::serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": [#(#required_params),*],
                "additionalProperties": false
            })
        }
    }
}

fn type_to_json_type(ty: &Type) -> &'static str {
    match ty {
        Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => match segment.ident.to_string().as_str() {
                "String" => "string",
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" => "integer",
                "f32" | "f64" => "number",
                "bool" => "boolean",
                "Vec" => "array",
                _ => "object",
            },
            None => "object",
        },
        _ => "object",
    }
}

fn generate_execute_impl(fn_name: &syn::Ident, params: &[Parameter], is_async: bool) -> TokenStream {
    let param_extractions = params.iter().map(|param| {
        let name = &param.name;
        let name_ident = quote::format_ident!("{}", name);
        let ty = &param.ty;

        if param.required {
            quote! {
                let #name_ident: #ty = params.get(#name)
                    .ok_or_else(|| LlmError::ToolExecution {
                        message: format!("Missing required parameter: {}", #name),
                        source: None,
                    })
                    .and_then(|v| ::serde_json::from_value(v.clone())
                        .map_err(|e| LlmError::ToolExecution {
                            message: format!("Invalid parameter '{}': {}", #name, e),
                            source: Some(Box::new(e)),
                        }))?;
            }
        } else {
            quote! {
                let #name_ident: Option<#ty> = params.get(#name)
                    .filter(|v| !v.is_null())
                    .map(|v| ::serde_json::from_value(v.clone()))
                    .transpose()
                    .map_err(|e| LlmError::ToolExecution {
                        message: format!("Invalid parameter '{}': {}", #name, e),
                        source: Some(Box::new(e)),
                    })?;
            }
        }
    });

    let param_names = params.iter().map(|p| quote::format_ident!("{}", p.name));
    let function_call = if is_async {
        quote! { #fn_name(#(#param_names),*).await }
    } else {
        quote! { #fn_name(#(#param_names),*) }
    };

    quote! {
        let params = params.as_object()
            .ok_or_else(|| LlmError::ToolExecution {
                message: "Parameters must be an object".to_string(),
                source: None,
            })?;

        #(#param_extractions)*

        let result = #function_call;

        ::serde_json::to_value(result)
            .map_err(|e| LlmError::ToolExecution {
                message: "Failed to serialize result".to_string(),
                source: Some(Box::new(e)),
            })
    }
}
