//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Procedural macros for worldsave.
//!
//! `Component` is a pure marker trait, so its derive is deliberately thin:
//! it exists so game code can tag a type as registry-storable in the same
//! attribute list as `Debug` or `Clone`, without spelling out the impl.
//! Everything the save system actually walks (the shape tree,
//! `to_value`/`from_value`) lives on `Saveable`, which stays hand-written
//! so wire names and field defaults are explicit in game code.
//!
//! ```ignore
//! use worldsave::Component;
//!
//! #[derive(Component, Debug, Clone)]
//! struct Position {
//!     x: f32,
//!     y: f32,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input, parse_quote};

/// Implements `worldsave::Component` for the annotated type.
///
/// The registry stores components type-erased behind `Send + Sync +
/// 'static`, so those bounds are part of the trait. For generic types the
/// derive pushes the same three bounds onto every type parameter, which
/// means a `Slot<T>` is a component exactly when `T` itself could be one.
///
/// Tag components additionally need `Default` (the loader constructs them
/// from bare entity ids); derive or implement that separately.
///
/// # Examples
///
/// ```ignore
/// use worldsave::Component;
///
/// #[derive(Component, Debug, Clone, Default)]
/// struct Paused;
///
/// #[derive(Component, Debug, Clone)]
/// struct Inventory<T: Send + Sync + 'static> {
///     slots: Vec<T>,
/// }
/// ```
#[proc_macro_derive(Component)]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;
    let (_, ty_generics, _) = input.generics.split_for_impl();

    // The impl side carries the registry's storage bounds on every type
    // parameter; the type's own generics stay as declared.
    let mut bounded = input.generics.clone();
    for param in bounded.type_params_mut() {
        param.bounds.push(parse_quote!(::std::marker::Send));
        param.bounds.push(parse_quote!(::std::marker::Sync));
        param.bounds.push(parse_quote!('static));
    }
    let (impl_generics, _, where_clause) = bounded.split_for_impl();

    quote! {
        impl #impl_generics ::worldsave::Component for #ident #ty_generics #where_clause {}
    }
    .into()
}
