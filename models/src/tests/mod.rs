mod instance;
