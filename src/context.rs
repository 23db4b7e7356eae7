/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Registries over the raw JSON model, built once per run.
//!
//! The context answers membership questions during type resolution (is this name a class, a
//! builtin, an enum, a native structure?) and owns the memoization cache for resolved types.

use std::collections::{HashMap, HashSet};

use crate::errors::BindgenError;
use crate::models::domain::{GodotTy, RustTy, TyName};
use crate::models::json::JsonExtensionApi;

#[derive(Default, Debug)]
pub struct Context<'a> {
    engine_classes: HashSet<&'a str>,
    builtin_types: HashSet<&'a str>,
    native_structures: HashSet<&'a str>,
    singletons: HashSet<&'a str>,
    global_enums: HashSet<&'a str>,

    /// Enums scoped to an engine class or builtin class, keyed `(surrounding type, enum name)`.
    scoped_enums: HashSet<(&'a str, &'a str)>,

    /// Builtin type name -> (shout-case name without `TYPE_`, Variant type ordinal).
    builtin_variant_tags: HashMap<&'a str, (&'a str, i32)>,

    inheritance_tree: InheritanceTree,
    cached_rust_types: HashMap<GodotTy, RustTy>,
}

impl<'a> Context<'a> {
    /// Builds all registries; detects duplicate classes and unresolvable base classes.
    pub fn build_from_api(api: &'a JsonExtensionApi) -> Result<Self, BindgenError> {
        let mut ctx = Context::default();

        for singleton in api.singletons.iter() {
            ctx.singletons.insert(singleton.name.as_str());
        }

        for builtin in api.builtin_classes.iter() {
            ctx.builtin_types.insert(builtin.name.as_str());

            for enum_ in builtin.enums.iter().flatten() {
                ctx.scoped_enums
                    .insert((builtin.name.as_str(), enum_.name.as_str()));
            }
        }

        for structure in api.native_structures.iter() {
            ctx.native_structures.insert(structure.name.as_str());
        }

        for enum_ in api.global_enums.iter() {
            ctx.global_enums.insert(enum_.name.as_str());
        }

        for class in api.classes.iter() {
            let class_name = class.name.as_str();
            if !ctx.engine_classes.insert(class_name) {
                return Err(BindgenError::DuplicateClass {
                    class: class_name.to_string(),
                });
            }

            for enum_ in class.enums.iter().flatten() {
                ctx.scoped_enums.insert((class_name, enum_.name.as_str()));
            }

            if let Some(base) = class.inherits.as_deref() {
                ctx.inheritance_tree
                    .insert(class_name.to_string(), base.to_string());
            }
        }

        // The forest invariant: every base must itself be a class of the same dump.
        for class in api.classes.iter() {
            if let Some(base) = class.inherits.as_deref() {
                if !ctx.engine_classes.contains(base) {
                    return Err(BindgenError::MissingBaseClass {
                        class: class.name.clone(),
                        base: base.to_string(),
                    });
                }
            }
        }

        ctx.build_variant_tags(api)?;

        Ok(ctx)
    }

    /// Associates builtin class names with their `Variant.Type` enumerator and ordinal.
    ///
    /// The enum spells names in shout case (`TYPE_PACKED_VECTOR2_ARRAY`) while builtin classes
    /// use pascal case (`PackedVector2Array`); matching is done on a normalized form.
    fn build_variant_tags(&mut self, api: &'a JsonExtensionApi) -> Result<(), BindgenError> {
        let variant_type_enum = api
            .global_enums
            .iter()
            .find(|e| e.name == "Variant.Type")
            .ok_or_else(|| BindgenError::SchemaDrift {
                message: "global enum `Variant.Type` is missing".to_string(),
            })?;

        let by_normalized: HashMap<String, &'a str> = api
            .builtin_classes
            .iter()
            .map(|c| (normalize(&c.name), c.name.as_str()))
            .collect();

        for enumerator in variant_type_enum.values.iter() {
            let shout_name = enumerator.name.strip_prefix("TYPE_").ok_or_else(|| {
                BindgenError::SchemaDrift {
                    message: format!(
                        "`Variant.Type` enumerator `{}` lacks the `TYPE_` prefix",
                        enumerator.name
                    ),
                }
            })?;

            // NIL and MAX are not types; OBJECT is a variant type but resolves as a class.
            if matches!(shout_name, "NIL" | "MAX" | "OBJECT") {
                continue;
            }

            let ord = i32::try_from(enumerator.value).map_err(|_| BindgenError::SchemaDrift {
                message: format!("`Variant.Type` ordinal {} out of range", enumerator.value),
            })?;

            if let Some(original) = by_normalized.get(&normalize(shout_name)).copied() {
                self.builtin_variant_tags.insert(original, (shout_name, ord));
            }
            // Scalar variant types (BOOL, INT, FLOAT) have no builtin class entry; they are
            // resolved as primitives instead.
        }

        Ok(())
    }

    pub fn is_engine_class(&self, ty_name: &str) -> bool {
        self.engine_classes.contains(ty_name)
    }

    pub fn is_builtin(&self, ty_name: &str) -> bool {
        self.builtin_types.contains(ty_name)
    }

    pub fn is_native_structure(&self, ty_name: &str) -> bool {
        self.native_structures.contains(ty_name)
    }

    pub fn is_singleton(&self, class_name: &str) -> bool {
        self.singletons.contains(class_name)
    }

    pub fn has_global_enum(&self, name: &str) -> bool {
        self.global_enums.contains(name)
    }

    pub fn has_scoped_enum(&self, surrounding: &str, name: &str) -> bool {
        self.scoped_enums.contains(&(surrounding, name))
    }

    pub fn builtin_variant_tag(&self, builtin_name: &str) -> Option<(&str, i32)> {
        self.builtin_variant_tags.get(builtin_name).copied()
    }

    pub fn inheritance_tree(&self) -> &InheritanceTree {
        &self.inheritance_tree
    }

    pub fn find_rust_type(&self, ty: &GodotTy) -> Option<&RustTy> {
        self.cached_rust_types.get(ty)
    }

    pub fn insert_rust_type(&mut self, ty: GodotTy, resolved: RustTy) {
        self.cached_rust_types.insert(ty, resolved);
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase().replace('_', "")
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[derive(Default, Debug)]
pub struct InheritanceTree {
    derived_to_base: HashMap<String, String>,
}

impl InheritanceTree {
    pub fn insert(&mut self, derived: String, base: String) {
        self.derived_to_base.insert(derived, base);
    }

    /// All base classes of `derived`, nearest first.
    pub fn collect_all_bases(&self, derived: &TyName) -> Vec<TyName> {
        let mut maybe_base = derived.godot_ty.as_str();
        let mut result = vec![];
        while let Some(base) = self.derived_to_base.get(maybe_base) {
            result.push(TyName::from_godot(base));
            maybe_base = base;
        }
        result
    }
}
