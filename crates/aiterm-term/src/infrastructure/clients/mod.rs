pub mod openai;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::ModelClientBox;
use crate::domain::models::ModelName;

pub struct ModelClientManager {}

impl ModelClientManager {
    pub fn get(name: ModelName) -> Result<ModelClientBox> {
        if name == ModelName::OpenAI {
            return Ok(Box::<openai::OpenAI>::default());
        }

        bail!(format!("No backend implemented for {name}"))
    }

    pub fn from_config(name: &str) -> Result<ModelClientBox> {
        match ModelName::parse(name) {
            Some(name) => return ModelClientManager::get(name),
            None => bail!(format!("Unknown model client {name}")),
        }
    }
}
