mod flow_table;
mod network;
mod predictor;
mod switch;
