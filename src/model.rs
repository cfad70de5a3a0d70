use std::fs::File;
use std::io::Read;

use image::imageops::FilterType;
use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};
use thiserror::Error;

const IMAGE_SIZE: u64 = 128;
const INPUT_OP: &str = "x";
const OUTPUT_OP: &str = "Identity";

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build model graph: {0}")]
    Tensorflow(#[from] tensorflow::Status),
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("graph operation `{0}` not found")]
    MissingOperation(&'static str),
    #[error("model execution failed: {0}")]
    Tensorflow(#[from] tensorflow::Status),
    #[error("model returned an empty probability vector")]
    EmptyOutput,
}

/// Seam between the HTTP layer and the model runtime: image bytes in,
/// per-class probability vector out.
pub trait Classifier: Send + Sync {
    fn probabilities(&self, image_data: &[u8]) -> Result<Vec<f32>, InferenceError>;
}

pub struct Model {
    session: Session,
    graph: Graph,
}

impl Model {
    pub fn load(model_path: &str) -> Result<Self, ModelLoadError> {
        let mut graph = Graph::new();
        let mut model_file = File::open(model_path)?;
        let mut model_bytes = Vec::new();
        model_file.read_to_end(&mut model_bytes)?;

        graph.import_graph_def(&model_bytes, &ImportGraphDefOptions::new())?;

        let session = Session::new(&SessionOptions::new(), &graph)?;

        Ok(Model { session, graph })
    }
}

impl Classifier for Model {
    fn probabilities(&self, image_data: &[u8]) -> Result<Vec<f32>, InferenceError> {
        let input_tensor = preprocess_image(image_data)?;

        let mut args = SessionRunArgs::new();

        let input_operation = self
            .graph
            .operation_by_name(INPUT_OP)?
            .ok_or(InferenceError::MissingOperation(INPUT_OP))?;

        let output_operation = self
            .graph
            .operation_by_name(OUTPUT_OP)?
            .ok_or(InferenceError::MissingOperation(OUTPUT_OP))?;

        args.add_feed(&input_operation, 0, &input_tensor);
        let output_token = args.request_fetch(&output_operation, 0);
        self.session.run(&mut args)?;
        let output_tensor: Tensor<f32> = args.fetch(output_token)?;

        let probabilities = output_tensor.to_vec();
        if probabilities.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }

        Ok(probabilities)
    }
}

/// Decodes the upload, forces 3-channel RGB, resizes to the model's fixed
/// 128x128 input grid and lays the pixels out as a `[1, 128, 128, 3]` batch.
pub fn preprocess_image(image_data: &[u8]) -> Result<Tensor<f32>, InferenceError> {
    let img = image::load_from_memory(image_data)?;
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(
        &rgb,
        IMAGE_SIZE as u32,
        IMAGE_SIZE as u32,
        FilterType::CatmullRom,
    );

    let mut flat_img = Vec::with_capacity((IMAGE_SIZE * IMAGE_SIZE * 3) as usize);
    for pixel in resized.pixels() {
        flat_img.push(pixel[0] as f32);
        flat_img.push(pixel[1] as f32);
        flat_img.push(pixel[2] as f32);
    }

    let mut tensor = Tensor::new(&[1, IMAGE_SIZE, IMAGE_SIZE, 3]);
    tensor.copy_from_slice(&flat_img);

    Ok(tensor)
}
