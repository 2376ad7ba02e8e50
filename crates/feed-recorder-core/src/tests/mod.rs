mod coordinator;
mod support;
