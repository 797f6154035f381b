mod common;
mod predictor;
