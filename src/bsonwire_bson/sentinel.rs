// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

/// Compares lower than every other BSON value.
///
/// The type carries no data, so every `MinKey` is the same value.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MinKey;

/// Compares higher than every other BSON value.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MaxKey;

impl fmt::Display for MinKey {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MinKey")
    }

}

impl fmt::Display for MaxKey {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaxKey")
    }

}

impl From<MinKey> for bson::Bson {

    fn from(_: MinKey) -> Self {
        bson::Bson::MinKey
    }

}

impl From<MaxKey> for bson::Bson {

    fn from(_: MaxKey) -> Self {
        bson::Bson::MaxKey
    }

}
