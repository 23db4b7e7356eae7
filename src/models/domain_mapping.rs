/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Mapping from JSON models to domain models.
//!
//! All member types are resolved eagerly here, so that every resolution and structural error
//! surfaces before any output is written.

use std::collections::HashMap;

use quote::format_ident;
use tracing::debug;

use crate::context::Context;
use crate::conv;
use crate::errors::BindgenError;
use crate::models::domain::{
    BuiltinSize, BuiltinVariant, Class, ClassMethod, ClassSignal, Constant, ConstantValue, Enum,
    Enumerator, EnumeratorValue, ExtensionApi, FnParam, FnQualifier, GodotApiVersion, ModName,
    NativeStructure, Property, TyName, UtilityFunction,
};
use crate::models::json::{
    JsonClass, JsonClassMethod, JsonConstant, JsonEnum, JsonExtensionApi, JsonHeader,
    JsonMethodArg, JsonNativeStructure, JsonProperty, JsonSignal, JsonUtilityFunction,
};
use crate::util::{option_as_slice, safe_ident};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Top-level

impl ExtensionApi {
    pub fn from_json(json: &JsonExtensionApi, ctx: &mut Context) -> Result<Self, BindgenError> {
        let mut classes = Vec::with_capacity(json.classes.len());
        for class in json.classes.iter() {
            classes.push(Class::from_json(class, ctx)?);
        }

        let mut global_enums = Vec::with_capacity(json.global_enums.len());
        for enum_ in json.global_enums.iter() {
            global_enums.push(Enum::from_json(enum_)?);
        }

        let mut utility_functions = Vec::with_capacity(json.utility_functions.len());
        for function in json.utility_functions.iter() {
            utility_functions.push(UtilityFunction::from_json(function, ctx)?);
        }

        let mut builtin_enums = Vec::new();
        for builtin in json.builtin_classes.iter() {
            for builtin_enum in builtin.enums.iter().flatten() {
                let mut mapped = Enum::from_json(&builtin_enum.to_enum())?;
                mapped.name = format_ident!(
                    "{}{}",
                    conv::to_pascal_case(&builtin.name),
                    conv::to_pascal_case(&builtin_enum.name)
                );
                mapped.godot_name = format!("{}.{}", builtin.name, builtin_enum.name);
                builtin_enums.push(mapped);
            }
        }

        Ok(Self {
            godot_version: GodotApiVersion::from_json(&json.header),
            builtins: BuiltinVariant::all_from_json(json)?,
            classes,
            global_constants: json
                .global_constants
                .iter()
                .filter_map(Constant::from_json)
                .collect(),
            global_enums,
            builtin_enums,
            utility_functions,
            native_structures: json
                .native_structures
                .iter()
                .map(NativeStructure::from_json)
                .collect(),
            builtin_sizes: BuiltinSize::all_from_json(json),
        })
    }
}

impl GodotApiVersion {
    pub fn from_json(header: &JsonHeader) -> Self {
        let version_string = header
            .version_full_name
            .strip_prefix("Godot Engine ")
            .unwrap_or(&header.version_full_name)
            .to_string();

        Self {
            major: header.version_major,
            minor: header.version_minor,
            patch: header.version_patch,
            version_string,
        }
    }
}

impl BuiltinVariant {
    /// Returns all variant types except `NIL` and `MAX`, ordered by enum ordinal value.
    pub fn all_from_json(json: &JsonExtensionApi) -> Result<Vec<Self>, BindgenError> {
        let variant_type_enum = json
            .global_enums
            .iter()
            .find(|e| e.name == "Variant.Type")
            .ok_or_else(|| BindgenError::SchemaDrift {
                message: "global enum `Variant.Type` is missing".to_string(),
            })?;

        let by_normalized: HashMap<String, &str> = json
            .builtin_classes
            .iter()
            .map(|c| (normalize(&c.name), c.name.as_str()))
            .collect();

        let mut all = Vec::new();
        for enumerator in variant_type_enum.values.iter() {
            let shout_name = enumerator.name.strip_prefix("TYPE_").ok_or_else(|| {
                BindgenError::SchemaDrift {
                    message: format!(
                        "`Variant.Type` enumerator `{}` lacks the `TYPE_` prefix",
                        enumerator.name
                    ),
                }
            })?;

            if matches!(shout_name, "NIL" | "MAX") {
                continue;
            }

            // OBJECT is a variant type without a builtin class definition in the JSON.
            let godot_original_name = if shout_name == "OBJECT" {
                "Object".to_string()
            } else {
                by_normalized
                    .get(&normalize(shout_name))
                    .map(|name| name.to_string())
                    .ok_or_else(|| BindgenError::SchemaDrift {
                        message: format!(
                            "variant type `TYPE_{shout_name}` has no matching builtin class"
                        ),
                    })?
            };

            let variant_type_ord =
                i32::try_from(enumerator.value).map_err(|_| BindgenError::SchemaDrift {
                    message: format!("`Variant.Type` ordinal {} out of range", enumerator.value),
                })?;

            all.push(Self {
                godot_original_name,
                godot_shout_name: shout_name.to_string(),
                variant_type_ord,
            });
        }

        all.sort_by_key(|v| v.variant_type_ord);
        Ok(all)
    }
}

impl BuiltinSize {
    fn all_from_json(json: &JsonExtensionApi) -> Vec<Self> {
        let mut result = Vec::new();
        for group in json.builtin_class_sizes.iter() {
            for size in group.sizes.iter() {
                result.push(Self {
                    builtin_original_name: size.name.clone(),
                    build_configuration: group.build_configuration.clone(),
                    size: size.size,
                });
            }
        }
        result
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase().replace('_', "")
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Classes + structures

impl Class {
    pub fn from_json(json: &JsonClass, ctx: &mut Context) -> Result<Self, BindgenError> {
        let ty_name = TyName::from_godot(&json.name);
        let mod_name = ModName::from_godot(&json.name);

        let constants = option_as_slice(&json.constants)
            .iter()
            .filter_map(Constant::from_json)
            .collect();

        let mut enums = Vec::new();
        for enum_ in option_as_slice(&json.enums) {
            enums.push(Enum::from_json(enum_)?);
        }

        let mut methods = Vec::new();
        for method in option_as_slice(&json.methods) {
            methods.push(ClassMethod::from_json(method, &ty_name, ctx)?);
        }

        let mut properties = Vec::new();
        for property in option_as_slice(&json.properties) {
            properties.push(Property::from_json(property, &ty_name, ctx)?);
        }

        let mut signals = Vec::new();
        for signal in option_as_slice(&json.signals) {
            signals.push(ClassSignal::from_json(signal, &ty_name, ctx)?);
        }

        Ok(Self {
            name: ty_name,
            mod_name,
            is_refcounted: json.is_refcounted,
            is_instantiable: json.is_instantiable,
            base_class: json.inherits.as_deref().map(TyName::from_godot),
            api_type: json.api_type,
            constants,
            enums,
            methods,
            properties,
            signals,
        })
    }
}

impl NativeStructure {
    pub fn from_json(json: &JsonNativeStructure) -> Self {
        Self {
            name: TyName::from_godot(&json.name),
            mod_name: ModName::from_godot(&json.name),
            format: json.format.clone(),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Constants + enums

impl Constant {
    /// Maps an `int`-typed constant; other types are not representable as Rust constants and
    /// are skipped with a diagnostic (current dumps only declare integral constants).
    pub fn from_json(json: &JsonConstant) -> Option<Self> {
        let Some(value) = json.to_i64() else {
            debug!(
                "skipping constant `{}` of non-integral type `{}`",
                json.name,
                json.type_name()
            );
            return None;
        };

        let value = match i32::try_from(value) {
            Ok(value) => ConstantValue::I32(value),
            Err(_) => ConstantValue::I64(value),
        };

        Some(Self {
            name: json.name.clone(),
            value,
        })
    }
}

impl Enum {
    pub fn from_json(json: &JsonEnum) -> Result<Self, BindgenError> {
        let is_bitfield = json.is_bitfield;

        let mut enumerators = Vec::with_capacity(json.values.len());
        for constant in json.values.iter() {
            let value = if is_bitfield {
                let ord = u64::try_from(constant.value).map_err(|_| BindgenError::SchemaDrift {
                    message: format!(
                        "bitfield enumerator `{}.{}` has negative value {}",
                        json.name, constant.name, constant.value
                    ),
                })?;
                EnumeratorValue::Bitfield(ord)
            } else {
                let ord = i32::try_from(constant.value).map_err(|_| BindgenError::SchemaDrift {
                    message: format!(
                        "enumerator `{}.{}` value {} is out of range for i32",
                        json.name, constant.name, constant.value
                    ),
                })?;
                EnumeratorValue::Enum(ord)
            };

            enumerators.push(Enumerator {
                name: safe_ident(&constant.name),
                godot_name: constant.name.clone(),
                value,
            });
        }

        // Global enum names may be dotted (`Variant.Type` -> `VariantType`); class-scoped
        // names are plain.
        Ok(Self {
            name: conv::make_enum_name(&json.name),
            godot_name: json.name.clone(),
            is_bitfield,
            enumerators,
        })
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Functions + properties + signals

impl ClassMethod {
    pub fn from_json(
        json: &JsonClassMethod,
        surrounding_class: &TyName,
        ctx: &mut Context,
    ) -> Result<Self, BindgenError> {
        if !json.is_virtual && json.hash.is_none() {
            return Err(BindgenError::MissingMethodHash {
                class: surrounding_class.godot_ty.clone(),
                method: json.name.clone(),
            });
        }

        let describe = |detail: &str| {
            format!(
                "{detail} of class method `{}::{}`",
                surrounding_class.godot_ty, json.name
            )
        };

        let parameters = map_parameters(&json.arguments, &describe, ctx)?;

        let return_value = match &json.return_value {
            Some(ret) => Some(
                conv::to_rust_type(&ret.type_, ret.meta.as_ref(), ctx)
                    .map_err(|e| e.into_bindgen(describe("return type")))?,
            ),
            None => None,
        };

        Ok(Self {
            name: json.name.clone(),
            godot_name: json.name.clone(),
            hash: json.hash,
            is_virtual: json.is_virtual,
            is_vararg: json.is_vararg,
            qualifier: FnQualifier::from_const_static(json.is_const, json.is_static),
            parameters,
            return_value,
            surrounding_class: surrounding_class.clone(),
        })
    }
}

impl ClassSignal {
    pub fn from_json(
        json: &JsonSignal,
        surrounding_class: &TyName,
        ctx: &mut Context,
    ) -> Result<Self, BindgenError> {
        let describe = |detail: &str| {
            format!(
                "{detail} of signal `{}::{}`",
                surrounding_class.godot_ty, json.name
            )
        };

        Ok(Self {
            name: json.name.clone(),
            parameters: map_parameters(&json.arguments, &describe, ctx)?,
        })
    }
}

impl Property {
    pub fn from_json(
        json: &JsonProperty,
        surrounding_class: &TyName,
        ctx: &mut Context,
    ) -> Result<Self, BindgenError> {
        let type_ = conv::to_rust_type(&json.type_, None, ctx).map_err(|e| {
            e.into_bindgen(format!(
                "property `{}::{}`",
                surrounding_class.godot_ty, json.name
            ))
        })?;

        Ok(Self {
            name: json.name.clone(),
            type_,
            getter: json.getter.clone().filter(|name| !name.is_empty()),
            setter: json.setter.clone().filter(|name| !name.is_empty()),
            index: json.index.filter(|i| *i >= 0),
        })
    }
}

impl UtilityFunction {
    pub fn from_json(json: &JsonUtilityFunction, ctx: &mut Context) -> Result<Self, BindgenError> {
        let describe = |detail: &str| format!("{detail} of utility function `{}`", json.name);

        let parameters = map_parameters(&json.arguments, &describe, ctx)?;

        let return_value = match &json.return_type {
            Some(ty) => Some(
                conv::to_rust_type(ty, None, ctx)
                    .map_err(|e| e.into_bindgen(describe("return type")))?,
            ),
            None => None,
        };

        Ok(Self {
            name: json.name.clone(),
            godot_name: json.name.clone(),
            hash: json.hash,
            is_vararg: json.is_vararg,
            parameters,
            return_value,
        })
    }
}

fn map_parameters(
    arguments: &Option<Vec<JsonMethodArg>>,
    describe: &dyn Fn(&str) -> String,
    ctx: &mut Context,
) -> Result<Vec<FnParam>, BindgenError> {
    let mut parameters = Vec::new();
    for arg in option_as_slice(arguments) {
        let type_ = conv::to_rust_type(&arg.type_, arg.meta.as_ref(), ctx)
            .map_err(|e| e.into_bindgen(describe(&format!("parameter `{}`", arg.name))))?;

        parameters.push(FnParam {
            name: safe_ident(&arg.name),
            type_,
            default_value: arg.default_value.clone(),
        });
    }

    Ok(parameters)
}
