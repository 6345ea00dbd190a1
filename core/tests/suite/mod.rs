mod pension_flow;
mod retry_classification;
