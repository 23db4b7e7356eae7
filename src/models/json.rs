/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! JSON models of the extension API dump.
//!
//! Deserialization is strict: every struct rejects unknown properties, so that engine schema
//! drift surfaces as an immediate error instead of silently ignored input. Declaring fields the
//! generator never reads is intentional; it keeps the whole document under the closed-world
//! check.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::errors::BindgenError;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// JSON models

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonExtensionApi {
    pub header: JsonHeader,
    pub builtin_class_sizes: Vec<JsonBuiltinSizes>,
    #[serde(default)]
    pub builtin_class_member_offsets: Vec<JsonMemberOffsetsGroup>,
    #[serde(default)]
    pub global_constants: Vec<JsonConstant>,
    pub global_enums: Vec<JsonEnum>,
    pub utility_functions: Vec<JsonUtilityFunction>,
    pub builtin_classes: Vec<JsonBuiltinClass>,
    pub classes: Vec<JsonClass>,
    pub singletons: Vec<JsonSingleton>,
    pub native_structures: Vec<JsonNativeStructure>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub version_patch: u8,
    #[allow(dead_code)]
    pub version_status: String,
    #[allow(dead_code)]
    pub version_build: String,
    pub version_full_name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBuiltinSizes {
    pub build_configuration: String,
    pub sizes: Vec<JsonBuiltinSizeForConfig>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBuiltinSizeForConfig {
    pub name: String,
    pub size: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonMemberOffsetsGroup {
    pub build_configuration: String,
    pub classes: Vec<JsonMemberOffsetsClass>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonMemberOffsetsClass {
    pub name: String,
    pub members: Vec<JsonMemberOffset>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonMemberOffset {
    pub member: String,
    pub offset: usize,
    pub meta: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBuiltinClass {
    pub name: String,
    #[allow(dead_code)]
    pub indexing_return_type: Option<String>,
    #[allow(dead_code)]
    pub is_keyed: bool,
    #[allow(dead_code)]
    pub members: Option<Vec<JsonMember>>,
    #[allow(dead_code)]
    pub constants: Option<Vec<JsonConstant>>,
    pub enums: Option<Vec<JsonBuiltinEnum>>, // no bitfield
    #[allow(dead_code)]
    pub operators: Vec<JsonOperator>,
    #[allow(dead_code)]
    pub methods: Option<Vec<JsonBuiltinMethod>>,
    #[allow(dead_code)]
    pub constructors: Vec<JsonConstructor>,
    #[allow(dead_code)]
    pub has_destructor: bool,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonClass {
    pub name: String,
    pub is_refcounted: bool,
    pub is_instantiable: bool,
    pub inherits: Option<String>,
    pub api_type: JsonClassApiType,
    pub constants: Option<Vec<JsonConstant>>,
    pub enums: Option<Vec<JsonEnum>>,
    pub methods: Option<Vec<JsonClassMethod>>,
    pub properties: Option<Vec<JsonProperty>>,
    pub signals: Option<Vec<JsonSignal>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonNativeStructure {
    pub name: String,
    pub format: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonSingleton {
    pub name: String,
    // Note: `type` currently has always same value as `name`, thus redundant
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub type_: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonEnum {
    pub name: String,
    pub is_bitfield: bool,
    pub values: Vec<JsonEnumConstant>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBuiltinEnum {
    pub name: String,
    pub values: Vec<JsonEnumConstant>,
}

impl JsonBuiltinEnum {
    pub fn to_enum(&self) -> JsonEnum {
        JsonEnum {
            name: self.name.clone(),
            is_bitfield: false,
            values: self.values.clone(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonEnumConstant {
    pub name: String,

    // i64 is common denominator for enum, bitfield and constant values.
    pub value: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonOperator {
    pub name: String,
    pub right_type: Option<String>, // null if unary
    pub return_type: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonMember {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonProperty {
    #[serde(rename = "type")]
    pub type_: String,
    pub name: String,
    pub setter: Option<String>,
    pub getter: Option<String>,
    pub index: Option<i32>, // can be -1
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonSignal {
    pub name: String,
    pub arguments: Option<Vec<JsonMethodArg>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonConstructor {
    pub index: usize,
    pub arguments: Option<Vec<JsonMethodArg>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonUtilityFunction {
    pub name: String,
    pub return_type: Option<String>,
    /// Category: `"general"` or `"math"`
    #[allow(dead_code)]
    pub category: String,
    pub is_vararg: bool,
    pub hash: i64,
    pub arguments: Option<Vec<JsonMethodArg>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(dead_code)]
pub struct JsonBuiltinMethod {
    pub name: String,
    pub return_type: Option<String>,
    pub is_vararg: bool,
    pub is_const: bool,
    pub is_static: bool,
    pub hash: Option<i64>,
    pub arguments: Option<Vec<JsonMethodArg>>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonClassMethod {
    pub name: String,
    pub is_const: bool,
    pub is_vararg: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    /// Only virtual functions have this field (Godot 4.4+).
    #[allow(dead_code)]
    pub is_required: Option<bool>,
    pub hash: Option<i64>,
    #[allow(dead_code)]
    pub hash_compatibility: Option<Vec<i64>>,
    pub return_value: Option<JsonMethodReturn>,
    pub arguments: Option<Vec<JsonMethodArg>>,
}

// Example: set_point_weight_scale ->
// [ {name: "id", type: "int", meta: "int64"},
//   {name: "weight_scale", type: "float", meta: "float"} ]
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonMethodArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub meta: Option<JsonTypeMeta>,
    pub default_value: Option<String>,
}

// Example: get_available_point_id -> {type: "int", meta: "int64"}
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct JsonMethodReturn {
    #[serde(rename = "type")]
    pub type_: String,
    pub meta: Option<JsonTypeMeta>,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// String-named enums

/// Width/representation refinement attached to `int`/`float` types.
///
/// Deserialized from the wire names; an unrecognized name is a hard error naming the value,
/// since it means the engine started emitting metadata this generator does not understand.
#[derive(Deserialize, Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[serde(try_from = "String")]
pub enum JsonTypeMeta {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Char16,
    Char32,
}

impl TryFrom<String> for JsonTypeMeta {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        let meta = match name.as_str() {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float" => Self::Float,
            "double" => Self::Double,
            "char16" => Self::Char16,
            "char32" => Self::Char32,
            other => {
                return Err(format!(
                    "string `{other}` does not correspond to any known value of type meta"
                ))
            }
        };

        Ok(meta)
    }
}

/// Classification of a class within the engine API surface.
#[derive(Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
#[serde(try_from = "String")]
pub enum JsonClassApiType {
    Core,
    Editor,
    Extension,
    EditorExtension,
}

impl TryFrom<String> for JsonClassApiType {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        let api_type = match name.as_str() {
            "core" => Self::Core,
            "editor" => Self::Editor,
            "extension" => Self::Extension,
            "editor_extension" => Self::EditorExtension,
            other => {
                return Err(format!(
                    "string `{other}` does not correspond to any known value of class API type"
                ))
            }
        };

        Ok(api_type)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Constants

/// A constant as declared in the dump.
///
/// The wire format is polymorphic: global constants carry a bare integer `value` and imply type
/// `int`, while class-scoped constants of builtin types carry a string `value` with an explicit
/// `type`. The distinction is decided once, during deserialization, and kept as a sum type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JsonConstant {
    pub name: String,
    pub value: JsonConstantValue,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JsonConstantValue {
    /// Bare integer; implicitly typed `int`.
    Numeric(i64),

    /// Explicitly typed, with the value kept in its textual form.
    Typed { ty: String, value: String },
}

impl JsonConstant {
    pub fn type_name(&self) -> &str {
        match &self.value {
            JsonConstantValue::Numeric(_) => "int",
            JsonConstantValue::Typed { ty, .. } => ty,
        }
    }

    /// Integer value, if this is an `int`-typed constant.
    pub fn to_i64(&self) -> Option<i64> {
        match &self.value {
            JsonConstantValue::Numeric(v) => Some(*v),
            JsonConstantValue::Typed { ty, value } if ty == "int" => value.parse().ok(),
            JsonConstantValue::Typed { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for JsonConstant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(JsonConstantVisitor)
    }
}

/// Raw `value` property, before it is reconciled with the optional `type` property.
enum RawConstantValue {
    Numeric(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for RawConstantValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawValueVisitor;

        impl Visitor<'_> for RawValueVisitor {
            type Value = RawConstantValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string constant value")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RawConstantValue::Numeric(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(RawConstantValue::Numeric)
                    .map_err(|_| E::custom(format!("constant value {v} is out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RawConstantValue::Text(v.to_string()))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct JsonConstantVisitor;

impl<'de> Visitor<'de> for JsonConstantVisitor {
    type Value = JsonConstant;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a constant object with `name`, `value` and optional `type`")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut name: Option<String> = None;
        let mut ty: Option<String> = None;
        let mut value: Option<RawConstantValue> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(de::Error::duplicate_field("name"));
                    }
                    name = Some(map.next_value()?);
                }
                "type" => {
                    if ty.is_some() {
                        return Err(de::Error::duplicate_field("type"));
                    }
                    ty = Some(map.next_value()?);
                }
                "value" => {
                    if value.is_some() {
                        return Err(de::Error::duplicate_field("value"));
                    }
                    value = Some(map.next_value()?);
                }
                other => {
                    return Err(de::Error::unknown_field(other, &["name", "type", "value"]));
                }
            }
        }

        let name = name.ok_or_else(|| de::Error::missing_field("name"))?;
        let value = value.ok_or_else(|| de::Error::missing_field("value"))?;

        // A numeric value means the type is implied to be `int`; declaring it anyway is
        // contradictory input, and guessing which of the two to trust is not an option.
        let value = match value {
            RawConstantValue::Numeric(v) => {
                if ty.is_some() {
                    return Err(de::Error::custom(format!(
                        "constant `{name}`: value was read as an integer but the type was declared"
                    )));
                }
                JsonConstantValue::Numeric(v)
            }
            RawConstantValue::Text(text) => {
                let ty = ty.ok_or_else(|| de::Error::missing_field("type"))?;
                JsonConstantValue::Typed { ty, value: text }
            }
        };

        Ok(JsonConstant { name, value })
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

pub fn load_extension_api(json: &str) -> Result<JsonExtensionApi, BindgenError> {
    let model: JsonExtensionApi = serde_json::from_str(json)?;

    if model.header.version_full_name.is_empty() {
        return Err(BindgenError::SchemaDrift {
            message: "header is missing the engine version name".to_string(),
        });
    }

    Ok(model)
}
