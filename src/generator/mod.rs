/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub mod central_files;
pub mod classes;
pub mod constants;
pub mod enums;
pub mod method_tables;
pub mod native_structures;
pub mod test_files;
pub mod utility_functions;
