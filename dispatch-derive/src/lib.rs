use proc_macro::TokenStream;
use proc_macro2::Literal;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Path, parse_macro_input};

#[proc_macro_derive(SlotLayout, attributes(type_name, extends, inherited))]
pub fn slot_layout(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let mut type_name = None;
    let mut parent: Option<Path> = None;
    for attribute in &input.attrs {
        if attribute.path().is_ident("type_name") {
            let args: LitStr = attribute.parse_args().unwrap();

            type_name = Some(args.value());
        } else if attribute.path().is_ident("extends") {
            parent = Some(attribute.parse_args().unwrap());
        }
    }

    let Some(type_name) = type_name else {
        panic!("SlotLayout requires a #[type_name(\"...\")] attribute.");
    };

    let Data::Enum(enum_) = input.data else {
        panic!("This macro can only be applied to enums.");
    };

    let name = input.ident;
    let mut variants = vec![];
    let mut slot_names = vec![];
    let mut inherited = vec![];

    for variant in enum_.variants {
        assert!(
            matches!(variant.fields, Fields::Unit),
            "Slot {} cannot carry fields",
            variant.ident
        );
        assert!(
            variant.discriminant.is_none(),
            "Slot {} cannot have an explicit index, indices follow declaration order",
            variant.ident
        );

        let is_inherited = variant
            .attrs
            .iter()
            .any(|x| x.path().is_ident("inherited"));

        if is_inherited {
            assert!(
                parent.is_some(),
                "Slot {} is marked #[inherited], but {name} has no #[extends(...)]",
                variant.ident
            );
            assert!(
                inherited.len() == variants.len(),
                "Inherited slot {} must be declared before the slots introduced by {name}",
                variant.ident
            );
            inherited.push(variant.ident.clone());
        }

        slot_names.push(Literal::string(&to_snake_case(&variant.ident)));
        variants.push(variant.ident);
    }

    let type_name_lit = Literal::string(&type_name);

    let layout = quote::quote! {
        impl ::dispatch::vtable::SlotLayout for #name {
            const TYPE_NAME: &'static str = #type_name_lit;
            const SLOTS: &'static [Self] = &[#(Self::#variants),*];

            fn index(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    #(Self::#variants => #slot_names),*
                }
            }
        }
    };

    let Some(parent) = parent else {
        return layout.into();
    };

    let from_arms = inherited.iter().map(|slot| {
        quote::quote! { #parent::#slot => Self::#slot }
    });

    let position_checks = inherited.iter().map(|slot| {
        let message = Literal::string(&format!(
            "{slot} must keep the slot index it has in the parent layout"
        ));

        quote::quote! {
            assert!(#parent::#slot as usize == #name::#slot as usize, #message);
        }
    });

    quote::quote! {
        #layout

        impl ::dispatch::vtable::Extends<#parent> for #name {}

        impl ::core::convert::From<#parent> for #name {
            fn from(slot: #parent) -> Self {
                match slot {
                    #(#from_arms),*
                }
            }
        }

        const _: () = {
            #(#position_checks)*
        };
    }
    .into()
}

fn to_snake_case(ident: &Ident) -> String {
    let mut result = String::new();

    for (i, character) in ident.to_string().chars().enumerate() {
        if character.is_uppercase() {
            if i != 0 {
                result.push('_');
            }
            result.extend(character.to_lowercase());
        } else {
            result.push(character);
        }
    }

    result
}
