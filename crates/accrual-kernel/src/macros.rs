// Copyright 2025 Accrual Maintainers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Generate a roundtrip property to assert that the CBOR encoder and decoder of a persisted row
/// can safely be called in sequence and yield the original input.
///
/// Requires:
/// - proptest
///
/// Usage:
///
/// # ```
/// # prop_cbor_roundtrip!(Row, any_row())
/// #
/// # // Or with an explicit test title in case a module contains multiple calls to the macro:
/// # prop_cbor_roundtrip!(prop_cbor_roundtrip_row, Row, any_row())
/// # ```
#[macro_export]
macro_rules! prop_cbor_roundtrip {
    ($title:ident, $ty:ty, $strategy:expr) => {
        proptest::proptest! {
            #[test]
            fn $title(val in $strategy) {
                let bytes = $crate::to_cbor(&val);
                proptest::prop_assert_eq!(Some(val), $crate::from_cbor::<$ty>(&bytes).ok());
            }
        }
    };

    ($ty:ty, $strategy:expr) => {
        $crate::prop_cbor_roundtrip!(prop_cbor_roundtrip, $ty, $strategy);
    };
}
