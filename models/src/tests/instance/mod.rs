mod builder;
mod id;
