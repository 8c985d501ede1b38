fn main() {
    shell_runout::cli::run();
}
