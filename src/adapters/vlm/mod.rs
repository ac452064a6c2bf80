pub mod zhipu;
