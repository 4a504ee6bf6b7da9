use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::storage::Flower;
use crate::types::{ChainId, EndId, FlowerName, GroupId};

use crate::admin::error::{AdminError, Result};

/// JSON description of a flower: its Groups, Ends, and optionally chains.
///
/// ```json
/// {
///   "name": 1,
///   "groups": [10],
///   "ends": [{ "id": 1, "group": 10 }, { "id": 2, "group": 10 }],
///   "chains": [{ "id": 100, "links": [[1, 2]] }]
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FlowerContext {
    /// Flower name.
    pub name: FlowerName,
    /// Groups of the flower.
    #[serde(default)]
    pub groups: Vec<GroupId>,
    /// Ends of the flower.
    #[serde(default)]
    pub ends: Vec<EndSpec>,
    /// Chains to build, as ordered `[three_end, five_end]` pairs.
    #[serde(default)]
    pub chains: Vec<ChainSpec>,
}

/// One End and the group it sits in.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct EndSpec {
    /// End identifier.
    pub id: EndId,
    /// Group identifier.
    pub group: GroupId,
}

/// One chain as a list of End pairs.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChainSpec {
    /// Chain identifier.
    pub id: ChainId,
    /// Links in chain order.
    #[serde(default)]
    pub links: Vec<(EndId, EndId)>,
}

impl FlowerContext {
    /// Reads a context from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AdminError::missing_file(path));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses a context from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a flower with the context's Groups and Ends but no chains.
    pub fn empty_flower(&self) -> Result<Flower> {
        let mut flower = Flower::new(self.name);
        for group in &self.groups {
            flower.add_group(*group)?;
        }
        for end in &self.ends {
            flower.add_end(end.id, end.group)?;
        }
        Ok(flower)
    }

    /// Builds the full flower, chains included.
    pub fn build(&self) -> Result<Flower> {
        let mut flower = self.empty_flower()?;
        for chain in &self.chains {
            flower.create_chain(chain.id)?;
            for (three_end, five_end) in &chain.links {
                flower.push_link(chain.id, *three_end, *five_end)?;
            }
        }
        Ok(flower)
    }
}
