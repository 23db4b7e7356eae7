/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::context::Context;
use crate::conv;
use crate::errors::BindgenError;
use crate::format_parser::{
    fields_of, parse_native_structure_format, LayoutError, NativeStructureField,
};
use crate::generator::classes::topological_class_order;
use crate::models::domain::{ExtensionApi, RustTy};
use crate::models::json::{
    load_extension_api, JsonClass, JsonConstant, JsonConstantValue, JsonMethodArg,
};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Name conversions

#[test]
fn test_pascal_conversion() {
    // More in line with Rust identifiers, and eases recognition of other automation.
    #[rustfmt::skip]
    let mappings = [
                                 ("AABB", "Aabb"),
                              ("AStar3D", "AStar3D"),
                       ("AudioStreamWAV", "AudioStreamWav"),
                       ("CPUParticles3D", "CpuParticles3D"),
                              ("JSONRPC", "JsonRpc"),
                             ("ObjectID", "ObjectId"),
                   ("PackedFloat32Array", "PackedFloat32Array"),
    ("PhysicsServer2DExtensionRayResult", "PhysicsServer2DExtensionRayResult"),
                               ("Rect2i", "Rect2i"),
                                  ("RID", "Rid"),
                          ("Transform3D", "Transform3D"),
                      ("X509Certificate", "X509Certificate"),
    ];

    for (class_name, expected) in mappings {
        let actual = conv::to_pascal_case(class_name);
        assert_eq!(actual, expected, "PascalCase: ident `{class_name}`");
    }
}

#[test]
fn test_snake_conversion() {
    #[rustfmt::skip]
    let mappings = [
                                 ("AABB", "aabb"),
                              ("AStar3D", "a_star_3d"),
                       ("CPUParticles3D", "cpu_particles_3d"),
                              ("JSONRPC", "json_rpc"),
                             ("ObjectID", "object_id"),
                   ("PackedFloat32Array", "packed_float32_array"),
    ("PhysicsServer2DExtensionRayResult", "physics_server_2d_extension_ray_result"),
                                ("Rect2", "rect2"),
                                  ("RID", "rid"),
                            ("VSyncMode", "vsync_mode"),
    ];

    for (class_name, expected) in mappings {
        let actual = conv::to_snake_case(class_name);
        assert_eq!(actual, expected, "snake_case: ident `{class_name}`");
    }
}

#[test]
fn test_shout_case() {
    assert_eq!(conv::to_shout_case("PackedVector2Array"), "PACKED_VECTOR2_ARRAY");
    assert_eq!(conv::to_shout_case("AudioFrame"), "AUDIO_FRAME");
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Structure layout parser

fn field(ty: &str, name: &str) -> NativeStructureField {
    NativeStructureField {
        field_type: ty.to_string(),
        field_name: name.to_string(),
        default_value: None,
        array_size: None,
    }
}

#[test]
fn test_parse_format_simple() {
    let fields = parse_native_structure_format("AudioFrame", "float left;float right").unwrap();

    assert_eq!(fields, vec![field("float", "left"), field("float", "right")]);
}

#[test]
fn test_parse_format_namespaced_types() {
    let fields = parse_native_structure_format(
        "CaretInfo",
        "Rect2 leading_caret;TextServer::Direction leading_direction",
    )
    .unwrap();

    assert_eq!(
        fields,
        vec![
            field("Rect2", "leading_caret"),
            field("TextServer::Direction", "leading_direction"),
        ]
    );
}

#[test]
fn test_parse_format_default_values() {
    let fields = parse_native_structure_format(
        "Glyph",
        "int start = -1;float x_off = 0.f;RID font_rid;int32_t index = 0",
    )
    .unwrap();

    // Default literals are kept verbatim, not reinterpreted.
    assert_eq!(fields[0].default_value.as_deref(), Some("-1"));
    assert_eq!(fields[1].default_value.as_deref(), Some("0.f"));
    assert_eq!(fields[2].default_value, None);
    assert_eq!(fields[3].default_value.as_deref(), Some("0"));
    assert_eq!(fields[3].field_type, "int32_t");
    assert_eq!(fields[3].field_name, "index");
}

#[test]
fn test_parse_format_pointer_types() {
    // The star belongs to the type token, with exactly one space before it.
    let fields = parse_native_structure_format(
        "PhysicsServer2DExtensionRayResult",
        "Vector2 position;ObjectID collider_id;Object *collider;int shape",
    )
    .unwrap();

    assert_eq!(
        fields,
        vec![
            field("Vector2", "position"),
            field("ObjectID", "collider_id"),
            field("Object *", "collider"),
            field("int", "shape"),
        ]
    );
}

#[test]
fn test_parse_format_fixed_array() {
    let fields = parse_native_structure_format(
        "PhysicsServer3DExtensionMotionResult",
        "PhysicsServer3DExtensionMotionCollision collisions[32];int collision_count",
    )
    .unwrap();

    assert_eq!(fields[0].array_size, Some(32));
    assert_eq!(fields[0].field_name, "collisions");
    assert_eq!(fields[0].default_value, None);
    assert_eq!(fields[1].array_size, None);
}

#[test]
fn test_parse_format_field_count_matches_segments() {
    let format = "float left;float right;int x = 2;";
    let non_empty_segments = format.split(';').filter(|s| !s.trim().is_empty()).count();

    let fields = parse_native_structure_format("S", format).unwrap();
    assert_eq!(fields.len(), non_empty_segments);
}

#[test]
fn test_parse_format_is_restartable() {
    let format = "float left;float right";

    let first: Vec<_> = fields_of(format).collect();
    let second: Vec<_> = fields_of(format).collect();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_parse_format_invalid_inputs() {
    // Missing space after type.
    let err = fields_of("int32_tfield_one").next().unwrap().unwrap_err();
    assert!(matches!(err, LayoutError::MissingSpace(_)), "got {err:?}");

    // Empty array brackets.
    let err = fields_of("int32_t field_one[]").next().unwrap().unwrap_err();
    assert!(matches!(err, LayoutError::InvalidArrayLength(_)), "got {err:?}");

    // Missing default value after `=`.
    let err = fields_of("int32_t field_one =").next().unwrap().unwrap_err();
    assert!(matches!(err, LayoutError::MissingDefaultValue(_)), "got {err:?}");

    // Zero-length arrays do not exist in native layouts.
    let err = fields_of("int32_t field_one[0]").next().unwrap().unwrap_err();
    assert!(matches!(err, LayoutError::InvalidArrayLength(_)), "got {err:?}");
}

#[test]
fn test_parse_format_error_names_structure_and_index() {
    let err = parse_native_structure_format("Glyph", "int start;int32_t end =").unwrap_err();

    let BindgenError::StructureLayout {
        structure,
        field_index,
        ..
    } = err
    else {
        panic!("expected StructureLayout error");
    };

    assert_eq!(structure, "Glyph");
    assert_eq!(field_index, 1);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Constant deserialization

#[test]
fn test_constant_numeric_implies_int() {
    let constant: JsonConstant = serde_json::from_str(r#"{"name":"X","value":5}"#).unwrap();

    assert_eq!(constant.name, "X");
    assert_eq!(constant.value, JsonConstantValue::Numeric(5));
    assert_eq!(constant.type_name(), "int");
    assert_eq!(constant.to_i64(), Some(5));
}

#[test]
fn test_constant_numeric_with_declared_type_is_contradictory() {
    let result = serde_json::from_str::<JsonConstant>(r#"{"name":"X","value":5,"type":"int"}"#);

    let err = result.unwrap_err().to_string();
    assert!(err.contains("the type was declared"), "got: {err}");
}

#[test]
fn test_constant_string_value_requires_type() {
    let ok: JsonConstant =
        serde_json::from_str(r#"{"name":"ONE","type":"Vector2","value":"Vector2(1, 1)"}"#).unwrap();
    assert_eq!(ok.type_name(), "Vector2");
    assert_eq!(ok.to_i64(), None);

    let err = serde_json::from_str::<JsonConstant>(r#"{"name":"ONE","value":"Vector2(1, 1)"}"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("missing field `type`"), "got: {err}");

    let err = serde_json::from_str::<JsonConstant>(r#"{"name":"ONE"}"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("missing field `value`"), "got: {err}");
}

#[test]
fn test_constant_unknown_property_is_rejected() {
    let err = serde_json::from_str::<JsonConstant>(r#"{"name":"X","value":1,"extra":true}"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("extra"), "got: {err}");
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Strict schema

#[test]
fn test_unknown_class_property_is_schema_drift() {
    let err = serde_json::from_str::<JsonClass>(
        r#"{"name":"Node","is_refcounted":false,"is_instantiable":true,"api_type":"core","color":5}"#,
    )
    .unwrap_err()
    .to_string();

    assert!(err.contains("color"), "got: {err}");
}

#[test]
fn test_unknown_type_meta_is_rejected_by_name() {
    let err = serde_json::from_str::<JsonMethodArg>(
        r#"{"name":"x","type":"int","meta":"int128"}"#,
    )
    .unwrap_err()
    .to_string();

    assert!(err.contains("int128"), "got: {err}");
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Fixtures

const FIXTURE_JSON: &str = r#"{
    "header": {
        "version_major": 4,
        "version_minor": 2,
        "version_patch": 0,
        "version_status": "stable",
        "version_build": "official",
        "version_full_name": "Godot Engine v4.2.stable.official"
    },
    "builtin_class_sizes": [
        {
            "build_configuration": "float_64",
            "sizes": [
                { "name": "Vector2", "size": 8 }
            ]
        }
    ],
    "global_constants": [
        { "name": "ANSWER", "value": 42 }
    ],
    "global_enums": [
        {
            "name": "Variant.Type",
            "is_bitfield": false,
            "values": [
                { "name": "TYPE_NIL", "value": 0 },
                { "name": "TYPE_STRING", "value": 4 },
                { "name": "TYPE_VECTOR2", "value": 5 },
                { "name": "TYPE_OBJECT", "value": 24 },
                { "name": "TYPE_PACKED_INT32_ARRAY", "value": 30 },
                { "name": "TYPE_MAX", "value": 38 }
            ]
        },
        {
            "name": "Error",
            "is_bitfield": false,
            "values": [
                { "name": "OK", "value": 0 },
                { "name": "FAILED", "value": 1 }
            ]
        }
    ],
    "utility_functions": [
        {
            "name": "absi",
            "return_type": "int",
            "category": "math",
            "is_vararg": false,
            "hash": 2998918348,
            "arguments": [
                { "name": "x", "type": "int" }
            ]
        }
    ],
    "builtin_classes": [
        {
            "name": "String",
            "is_keyed": false,
            "operators": [],
            "constructors": [],
            "has_destructor": true
        },
        {
            "name": "Vector2",
            "is_keyed": false,
            "enums": [
                {
                    "name": "Axis",
                    "values": [
                        { "name": "AXIS_X", "value": 0 },
                        { "name": "AXIS_Y", "value": 1 }
                    ]
                }
            ],
            "operators": [],
            "constructors": [],
            "has_destructor": false
        },
        {
            "name": "PackedInt32Array",
            "is_keyed": false,
            "operators": [],
            "constructors": [],
            "has_destructor": true
        }
    ],
    "classes": [
        {
            "name": "Node2D",
            "is_refcounted": false,
            "is_instantiable": true,
            "inherits": "Node",
            "api_type": "core",
            "methods": [
                {
                    "name": "get_position",
                    "is_const": true,
                    "is_vararg": false,
                    "is_static": false,
                    "is_virtual": false,
                    "hash": 3341600327,
                    "return_value": { "type": "Vector2" }
                }
            ]
        },
        {
            "name": "Node",
            "is_refcounted": false,
            "is_instantiable": true,
            "inherits": "Object",
            "api_type": "core",
            "constants": [
                { "name": "NOTIFICATION_READY", "value": 13 }
            ],
            "enums": [
                {
                    "name": "ProcessMode",
                    "is_bitfield": false,
                    "values": [
                        { "name": "PROCESS_MODE_INHERIT", "value": 0 },
                        { "name": "PROCESS_MODE_ALWAYS", "value": 3 }
                    ]
                }
            ],
            "methods": [
                {
                    "name": "set_process_mode",
                    "is_const": false,
                    "is_vararg": false,
                    "is_static": false,
                    "is_virtual": false,
                    "hash": 1841290486,
                    "arguments": [
                        { "name": "mode", "type": "enum::Node.ProcessMode" }
                    ]
                },
                {
                    "name": "get_process_priority",
                    "is_const": true,
                    "is_vararg": false,
                    "is_static": false,
                    "is_virtual": false,
                    "hash": 3905245786,
                    "return_value": { "type": "int", "meta": "int32" }
                },
                {
                    "name": "set_process_priority",
                    "is_const": false,
                    "is_vararg": false,
                    "is_static": false,
                    "is_virtual": false,
                    "hash": 1286410249,
                    "arguments": [
                        { "name": "priority", "type": "int", "meta": "int32" }
                    ]
                }
            ],
            "properties": [
                {
                    "type": "int",
                    "name": "process_priority",
                    "setter": "set_process_priority",
                    "getter": "get_process_priority"
                }
            ],
            "signals": [
                {
                    "name": "renamed"
                }
            ]
        },
        {
            "name": "Object",
            "is_refcounted": false,
            "is_instantiable": true,
            "api_type": "core",
            "methods": [
                {
                    "name": "get_class",
                    "is_const": true,
                    "is_vararg": false,
                    "is_static": false,
                    "is_virtual": false,
                    "hash": 3271243649,
                    "return_value": { "type": "String" }
                }
            ]
        }
    ],
    "singletons": [],
    "native_structures": [
        {
            "name": "AudioFrame",
            "format": "float left;float right"
        },
        {
            "name": "PhysicsServer2DExtensionRayResult",
            "format": "Vector2 position;Object *collider;int shape"
        }
    ]
}"#;

const FIXTURE_HEADER: &str = r#"
/**
 * @name classdb_get_method_bind
 *
 * Gets a pointer to the MethodBind in ClassDB for the given class, method and hash.
 */
typedef GDExtensionMethodBindPtr (*GDExtensionInterfaceClassdbGetMethodBind)(GDExtensionConstStringNamePtr p_classname, GDExtensionConstStringNamePtr p_methodname, GDExtensionInt p_hash);

/**
 * @name variant_get_ptr_utility_function
 *
 * Gets a pointer to a function that can call a Variant utility function.
 */
typedef void (*GDExtensionInterfaceVariantGetPtrUtilityFunction)(GDExtensionConstStringNamePtr p_function, GDExtensionInt p_hash);
"#;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Type resolution

#[test]
fn test_resolver_rules() {
    let json_api = load_extension_api(FIXTURE_JSON).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();

    // Rule 1: primitives with explicit width.
    let ty = conv::to_rust_type("int", None, &mut ctx).unwrap();
    assert_eq!(ty.to_string(), "i64");

    let meta = serde_json::from_str(r#""int32""#).unwrap();
    let ty = conv::to_rust_type("int", Some(&meta), &mut ctx).unwrap();
    assert_eq!(ty.to_string(), "i32");

    // Rule 2: builtin Variant types carry their type tag.
    let ty = conv::to_rust_type("Vector2", None, &mut ctx).unwrap();
    let RustTy::BuiltinVariant {
        sys_variant_type, ..
    } = &ty
    else {
        panic!("Vector2 should resolve as builtin, got {ty:?}");
    };
    assert_eq!(sys_variant_type.to_string(), "GDEXTENSION_VARIANT_TYPE_VECTOR2");

    // Rule 3: enums, in both spellings.
    let ty = conv::to_rust_type("enum::Node.ProcessMode", None, &mut ctx).unwrap();
    assert!(matches!(ty, RustTy::EngineEnum { .. }));
    assert!(ty.to_string().contains("ProcessMode"));

    let ty = conv::to_rust_type("Vector2::Axis", None, &mut ctx).unwrap();
    assert!(ty.to_string().contains("Vector2Axis"));

    // Rule 4: engine classes resolve to handles.
    let ty = conv::to_rust_type("Node", None, &mut ctx).unwrap();
    assert!(matches!(ty, RustTy::EngineClass { .. }));
    assert!(ty.to_string().contains("Gd<"));

    // Rule 5: packed arrays carry their element type.
    let ty = conv::to_rust_type("PackedInt32Array", None, &mut ctx).unwrap();
    let RustTy::PackedArray { elem_ty, .. } = &ty else {
        panic!("PackedInt32Array should resolve as packed array, got {ty:?}");
    };
    assert_eq!(elem_ty.to_string(), "i32");

    // Rule 6: native structures by value.
    let ty = conv::to_rust_type("AudioFrame", None, &mut ctx).unwrap();
    assert!(matches!(ty, RustTy::NativeStructure { .. }));

    // Rule 7: pointers wrap the base resolution.
    let ty = conv::to_rust_type("AudioFrame*", None, &mut ctx).unwrap();
    let RustTy::RawPointer { inner, is_const } = &ty else {
        panic!("expected pointer, got {ty:?}");
    };
    assert!(!*is_const);
    assert!(matches!(**inner, RustTy::NativeStructure { .. }));

    let ty = conv::to_rust_type("const uint8_t*", None, &mut ctx).unwrap();
    assert_eq!(ty.to_string(), "*constu8");

    // Rule 8: everything else is a hard error.
    assert!(conv::to_rust_type("Banana", None, &mut ctx).is_err());
}

#[test]
fn test_resolver_is_memoized_and_deterministic() {
    let json_api = load_extension_api(FIXTURE_JSON).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();

    let first = conv::to_rust_type("Vector2", None, &mut ctx).unwrap();
    let second = conv::to_rust_type("Vector2", None, &mut ctx).unwrap();

    assert_eq!(first.to_string(), second.to_string());
    assert!(
        matches!(
            (&first, &second),
            (RustTy::BuiltinVariant { .. }, RustTy::BuiltinVariant { .. })
        ),
        "marshalling kind must be stable within a run"
    );
}

#[test]
fn test_resolver_abi_types() {
    let json_api = load_extension_api(FIXTURE_JSON).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();

    // In native structures, `int`/`float` denote the C types.
    let (ty, is_obj) = conv::to_rust_type_abi("int", &mut ctx).unwrap();
    assert_eq!(ty.to_string(), "i32");
    assert!(!is_obj);

    let (ty, is_obj) = conv::to_rust_type_abi("Object*", &mut ctx).unwrap();
    assert_eq!(ty.to_string(), "*mutc_void");
    assert!(is_obj);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Structural validation

fn fixture_with_classes(classes_json: &str) -> String {
    FIXTURE_JSON.replace(
        r#""classes": ["#,
        &format!(r#""classes": [{classes_json}"#),
    )
}

#[test]
fn test_missing_base_class_is_fatal() {
    let json = fixture_with_classes(
        r#"{ "name": "Orphan", "is_refcounted": false, "is_instantiable": true,
             "inherits": "Ghost", "api_type": "core" },"#,
    );

    let json_api = load_extension_api(&json).unwrap();
    let err = Context::build_from_api(&json_api).unwrap_err();

    assert!(
        matches!(err, BindgenError::MissingBaseClass { ref class, ref base } if class == "Orphan" && base == "Ghost"),
        "got {err}"
    );
}

#[test]
fn test_duplicate_class_is_fatal() {
    let json = fixture_with_classes(
        r#"{ "name": "Object", "is_refcounted": false, "is_instantiable": true, "api_type": "core" },"#,
    );

    let json_api = load_extension_api(&json).unwrap();
    let err = Context::build_from_api(&json_api).unwrap_err();

    assert!(
        matches!(err, BindgenError::DuplicateClass { ref class } if class == "Object"),
        "got {err}"
    );
}

#[test]
fn test_missing_method_hash_is_fatal() {
    let json = fixture_with_classes(
        r#"{ "name": "Drifted", "is_refcounted": false, "is_instantiable": true, "api_type": "core",
             "methods": [
                 { "name": "do_thing", "is_const": false, "is_vararg": false,
                   "is_static": false, "is_virtual": false }
             ] },"#,
    );

    let json_api = load_extension_api(&json).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();
    let err = ExtensionApi::from_json(&json_api, &mut ctx).unwrap_err();

    assert!(
        matches!(err, BindgenError::MissingMethodHash { ref class, ref method } if class == "Drifted" && method == "do_thing"),
        "got {err}"
    );
}

#[test]
fn test_unresolved_member_type_names_member() {
    let json = fixture_with_classes(
        r#"{ "name": "Weird", "is_refcounted": false, "is_instantiable": true, "api_type": "core",
             "methods": [
                 { "name": "frob", "is_const": false, "is_vararg": false,
                   "is_static": false, "is_virtual": false, "hash": 1,
                   "arguments": [ { "name": "what", "type": "Banana" } ] }
             ] },"#,
    );

    let json_api = load_extension_api(&json).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();
    let err = ExtensionApi::from_json(&json_api, &mut ctx).unwrap_err();

    let BindgenError::UnresolvedType { ty, member } = err else {
        panic!("expected UnresolvedType, got {err}");
    };
    assert_eq!(ty, "Banana");
    assert!(member.contains("Weird::frob"), "got: {member}");
    assert!(member.contains("what"), "got: {member}");
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Emission order

#[test]
fn test_topological_emission_order() {
    // Input order is Node2D, Node, Object; emission must be base-first.
    let json_api = load_extension_api(FIXTURE_JSON).unwrap();
    let mut ctx = Context::build_from_api(&json_api).unwrap();
    let api = ExtensionApi::from_json(&json_api, &mut ctx).unwrap();

    let order: Vec<&str> = topological_class_order(&api.classes)
        .unwrap()
        .iter()
        .map(|c| c.name.godot_ty.as_str())
        .collect();

    assert_eq!(order, vec!["Object", "Node", "Node2D"]);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// End-to-end

#[test]
fn test_generate_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let api_path = tmp.path().join("extension_api.json");
    let header_path = tmp.path().join("gdextension_interface.h");
    std::fs::write(&api_path, FIXTURE_JSON).unwrap();
    std::fs::write(&header_path, FIXTURE_HEADER).unwrap();

    let options = crate::GenerateOptions {
        extension_api: api_path,
        extension_interface: header_path,
        output_dir: tmp.path().join("gen"),
        test_output_dir: Some(tmp.path().join("gen_tests")),
    };

    crate::generate(&options).unwrap();

    let out = &options.output_dir;
    for file in [
        "mod.rs",
        "sys.rs",
        "global.rs",
        "tables.rs",
        "utilities.rs",
        "classes/mod.rs",
        "classes/object.rs",
        "classes/node.rs",
        "classes/node_2d.rs",
        "native/mod.rs",
        "native/audio_frame.rs",
    ] {
        assert!(out.join(file).is_file(), "missing generated file `{file}`");
    }

    // Base classes are declared before derived ones.
    let classes_mod = std::fs::read_to_string(out.join("classes/mod.rs")).unwrap();
    let object_pos = classes_mod.find("mod object").unwrap();
    let node_pos = classes_mod.find("mod node").unwrap();
    let node_2d_pos = classes_mod.find("mod node_2d").unwrap();
    assert!(object_pos < node_pos && node_pos < node_2d_pos);

    // The Variant type tag from the dump appears in the sys file.
    let sys = std::fs::read_to_string(out.join("sys.rs")).unwrap();
    assert!(sys.contains("GDEXTENSION_VARIANT_TYPE_VECTOR2"));
    assert!(sys.contains("GDExtensionInterface"));

    // Method binds are loaded with their ABI hash.
    let tables = std::fs::read_to_string(out.join("tables.rs")).unwrap();
    assert!(tables.contains("3341600327i64"));

    let tests_file = tmp.path().join("gen_tests/generated_tests.rs");
    assert!(tests_file.is_file());

    // A rerun over the same input produces byte-identical output.
    let before = std::fs::read_to_string(out.join("classes/node.rs")).unwrap();
    crate::generate(&options).unwrap();
    let after = std::fs::read_to_string(out.join("classes/node.rs")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_generate_failure_leaves_previous_output_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let api_path = tmp.path().join("extension_api.json");
    let header_path = tmp.path().join("gdextension_interface.h");

    let bad_json = fixture_with_classes(
        r#"{ "name": "Weird", "is_refcounted": false, "is_instantiable": true, "api_type": "core",
             "methods": [
                 { "name": "frob", "is_const": false, "is_vararg": false,
                   "is_static": false, "is_virtual": false, "hash": 1,
                   "arguments": [ { "name": "what", "type": "Banana" } ] }
             ] },"#,
    );
    std::fs::write(&api_path, bad_json).unwrap();
    std::fs::write(&header_path, FIXTURE_HEADER).unwrap();

    let out_dir = tmp.path().join("gen");
    std::fs::create_dir_all(&out_dir).unwrap();
    let sentinel = out_dir.join("previous_run.rs");
    std::fs::write(&sentinel, "// previous output").unwrap();

    let options = crate::GenerateOptions {
        extension_api: api_path,
        extension_interface: header_path,
        output_dir: out_dir,
        test_output_dir: None,
    };

    let err = crate::generate(&options).unwrap_err();
    assert!(matches!(err, BindgenError::UnresolvedType { .. }), "got {err}");

    // No partial output: the previous run's files are still in place.
    assert!(sentinel.is_file());
}
