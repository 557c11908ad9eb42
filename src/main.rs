// Keyframer - command line entry point

fn main() {
    keyframer_lib::run()
}
